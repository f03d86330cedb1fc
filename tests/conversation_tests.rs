use async_trait::async_trait;
use image::{Rgb, RgbImage};
use parley::client::{ClientError, Transport};
use parley::model::{Message, Modality, ModelCatalog, Role};
use parley::options::ModelOptions;
use parley::Conversation;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone)]
struct Request {
    url: String,
    headers: Vec<(String, String)>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockTransport {
    responses: Arc<Mutex<Vec<Result<Value, ClientError>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockTransport {
    fn replying(replies: &[&str]) -> Self {
        let responses = replies
            .iter()
            .map(|reply| {
                Ok(json!({
                    "choices": [{"message": {"role": "assistant", "content": reply}, "finish_reason": "stop"}],
                    "usage": {"prompt_tokens": 5, "completion_tokens": 3}
                }))
            })
            .collect();
        Self::with_responses(responses)
    }

    fn with_responses(responses: Vec<Result<Value, ClientError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Value,
    ) -> Result<Value, ClientError> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            headers: headers.to_vec(),
            body: body.clone(),
        });
        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            responses.remove(0)
        } else {
            Err(ClientError::Transport {
                status: None,
                message: "No more mock responses".to_string(),
            })
        }
    }
}

fn conversation(modality: &str, model: &str, transport: MockTransport) -> Conversation<MockTransport> {
    Conversation::builder("test-key")
        .modality(modality)
        .model(model)
        .build_with_transport(transport)
        .unwrap()
}

fn write_image(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("square.png");
    RgbImage::from_pixel(8, 8, Rgb([0, 128, 255])).save(&path).unwrap();
    path
}

#[tokio::test]
async fn test_text_ask_records_exchange() {
    let transport = MockTransport::replying(&["Bonjour!"]);
    let mut convo = conversation("text", "mistral-large-latest", transport.clone());

    let reply = convo.ask("hello", None).await.unwrap();

    assert_eq!(reply, Message::assistant("Bonjour!"));
    assert_eq!(
        convo.history(),
        &[Message::user("hello"), Message::assistant("Bonjour!")]
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://api.mistral.ai/v1/chat/completions");
    assert!(requests[0]
        .headers
        .contains(&("Authorization".to_string(), "Bearer test-key".to_string())));
    assert_eq!(
        requests[0].body,
        json!({
            "model": "mistral-large-latest",
            "messages": [{"role": "user", "content": "hello"}]
        })
    );
}

#[tokio::test]
async fn test_history_alternates_in_call_order() {
    let transport = MockTransport::replying(&["one", "two", "three"]);
    let mut convo = conversation("text", "mistral-small-latest", transport);

    for question in ["a", "b", "c"] {
        convo.ask(question, None).await.unwrap();
    }

    let history = convo.history();
    assert_eq!(history.len(), 6);
    for (i, message) in history.iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(message.role(), expected);
    }
    let contents: Vec<&str> = history.iter().map(|m| m.content()).collect();
    assert_eq!(contents, ["a", "one", "b", "two", "c", "three"]);
}

#[tokio::test]
async fn test_clear_history_keeps_selection() {
    let transport = MockTransport::replying(&["x", "y"]);
    let mut convo = conversation("text", "codestral-latest", transport);

    convo.ask("first", None).await.unwrap();
    convo.clear_history();
    assert!(convo.history().is_empty());
    assert_eq!(convo.model(), "codestral-latest");
    assert_eq!(convo.modality(), Modality::Text);

    convo.ask("second", None).await.unwrap();
    assert_eq!(convo.history()[0], Message::user("second"));
}

#[tokio::test]
async fn test_text_conversation_rejects_attachment() {
    let transport = MockTransport::replying(&["unused"]);
    let mut convo = conversation("text", "mistral-large-latest", transport.clone());

    let result = convo.ask("describe", Some(Path::new("/tmp/cat.png"))).await;

    match result {
        Err(ClientError::ModalityMismatch { active, requested }) => {
            assert_eq!(active, Modality::Text);
            assert_eq!(requested, Modality::Image);
        }
        other => panic!("Expected ModalityMismatch, got {:?}", other),
    }
    assert!(transport.requests().is_empty());
    assert!(convo.history().is_empty());
}

#[tokio::test]
async fn test_image_conversation_requires_attachment() {
    let transport = MockTransport::replying(&["unused"]);
    let mut convo = conversation("image", "pixtral-12b-2409", transport.clone());

    let result = convo.ask("describe", None).await;

    assert!(matches!(
        result,
        Err(ClientError::ModalityMismatch {
            active: Modality::Image,
            requested: Modality::Text
        })
    ));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_missing_attachment_leaves_history_unchanged() {
    let transport = MockTransport::replying(&["unused"]);
    let mut convo = conversation("image", "pixtral-12b-2409", transport.clone());

    let result = convo.ask("describe", Some(Path::new("/missing.png"))).await;

    assert!(matches!(result, Err(ClientError::AttachmentNotFound(_))));
    assert_eq!(convo.history().len(), 0);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_image_ask_sends_text_and_image_blocks() {
    let dir = TempDir::new().unwrap();
    let path = write_image(&dir);
    let transport = MockTransport::replying(&["A blue square."]);
    let mut convo = conversation("image", "pixtral-12b-2409", transport.clone());

    let reply = convo.ask("What is this?", Some(&path)).await.unwrap();
    assert_eq!(reply.content(), "A blue square.");

    let body = &transport.requests()[0].body;
    assert_eq!(body["model"], "pixtral-12b-2409");
    let content = &body["messages"][0]["content"];
    assert_eq!(content[0], json!({"type": "text", "text": "What is this?"}));
    assert_eq!(content[1]["type"], "image_url");
    assert!(content[1]["image_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));

    assert_eq!(
        convo.history(),
        &[Message::user("What is this?"), Message::assistant("A blue square.")]
    );
}

#[tokio::test]
async fn test_transport_error_surfaces_without_history() {
    let transport = MockTransport::with_responses(vec![Err(ClientError::Transport {
        status: Some(401),
        message: "Unauthorized".to_string(),
    })]);
    let mut convo = conversation("text", "mistral-large-latest", transport);

    match convo.ask("hello", None).await {
        Err(ClientError::Transport { status, .. }) => assert_eq!(status, Some(401)),
        other => panic!("Expected Transport error, got {:?}", other),
    }
    assert!(convo.history().is_empty());
}

#[tokio::test]
async fn test_malformed_response_is_parse_error() {
    let transport = MockTransport::with_responses(vec![Ok(json!({"choices": []}))]);
    let mut convo = conversation("text", "mistral-large-latest", transport);

    let result = convo.ask("hello", None).await;

    assert!(matches!(result, Err(ClientError::ResponseParse(_))));
    assert!(convo.history().is_empty());
}

#[tokio::test]
async fn test_model_options_and_base_url_reach_request() {
    let transport = MockTransport::replying(&["ok"]);
    let mut convo = Conversation::builder("k")
        .base_url("http://localhost:8080/")
        .model_options(ModelOptions::new().with_system("Reply in French.").with_temperature(0.5))
        .build_with_transport(transport.clone())
        .unwrap();

    assert_eq!(convo.model(), "mistral-large-latest");
    convo.ask("hi", None).await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.url, "http://localhost:8080/v1/chat/completions");
    assert_eq!(request.body["temperature"], 0.5);
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(request.body["messages"][1]["content"], "hi");
}

#[tokio::test]
async fn test_shared_conversation_behind_mutex() {
    let transport = MockTransport::replying(&["1", "2", "3", "4"]);
    let convo = Arc::new(tokio::sync::Mutex::new(conversation(
        "text",
        "mistral-large-latest",
        transport,
    )));

    let mut handles = Vec::new();
    for i in 0..4 {
        let convo = convo.clone();
        handles.push(tokio::spawn(async move {
            convo.lock().await.ask(&format!("q{}", i), None).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let convo = convo.lock().await;
    let history = convo.history();
    assert_eq!(history.len(), 8);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role(), Role::User);
        assert_eq!(pair[1].role(), Role::Assistant);
    }
}

#[test]
fn test_construction_validates_catalog() {
    let catalog = ModelCatalog::mistral();

    for modality in [Modality::Text, Modality::Image] {
        for model in catalog.models(modality) {
            let convo = conversation(modality.as_str(), model, MockTransport::default());
            assert_eq!(convo.modality(), modality);
            assert_eq!(convo.model(), model);
        }
    }

    let mismatched = Conversation::builder("k")
        .modality("text")
        .model("pixtral-12b-2409")
        .build_with_transport(MockTransport::default());
    assert!(matches!(
        mismatched,
        Err(ClientError::InvalidModel {
            modality: Modality::Text,
            ..
        })
    ));

    let unknown = Conversation::builder("k")
        .modality("video")
        .model("mistral-large-latest")
        .build_with_transport(MockTransport::default());
    assert!(matches!(unknown, Err(ClientError::InvalidModality(_))));
}

#[test]
fn test_custom_catalog() {
    let catalog = ModelCatalog::new().with_model(Modality::Image, "local-vision");

    let convo = Conversation::builder("k")
        .modality("multimodal")
        .catalog(catalog.clone())
        .build_with_transport(MockTransport::default())
        .unwrap();
    assert_eq!(convo.model(), "local-vision");

    let no_text = Conversation::builder("k")
        .catalog(catalog)
        .build_with_transport(MockTransport::default());
    assert!(matches!(no_text, Err(ClientError::InvalidModel { .. })));
}
