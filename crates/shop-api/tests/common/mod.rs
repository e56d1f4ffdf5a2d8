//! Shared fixtures for the HTTP tests: in-memory providers and a test server.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use serde_json::Value;
use shop_api::{create_router, AppConfig, AppState};
use shop_core::{
    Catalog, CheckoutRequest, CheckoutSession, Contact, ContactDirectory, EmailMessage, Item,
    Mailer, PaidSession, PaymentStrategy, ShopError, ShopResult,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SERVER_URL: &str = "https://api.example.com";
pub const CLIENT_URL: &str = "https://shop.example.com";

/// Payment provider that hands out sequential session ids and returns
/// whatever sessions the test registered.
#[derive(Default)]
pub struct FakePayments {
    created: Mutex<Vec<CheckoutRequest>>,
    sessions: Mutex<HashMap<String, PaidSession>>,
}

impl FakePayments {
    pub fn with_session(self, session_id: &str, email: Option<&str>, status: &str) -> Self {
        self.sessions.lock().unwrap().insert(
            session_id.to_string(),
            PaidSession {
                session_id: session_id.to_string(),
                customer_email: email.map(str::to_string),
                payment_status: status.to_string(),
            },
        );
        self
    }

    pub fn created(&self) -> Vec<CheckoutRequest> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentStrategy for FakePayments {
    async fn create_checkout(&self, request: &CheckoutRequest) -> ShopResult<CheckoutSession> {
        let mut created = self.created.lock().unwrap();
        created.push(request.clone());
        Ok(CheckoutSession {
            session_id: format!("cs_test_{}", created.len()),
            checkout_url: None,
            provider: "fake".to_string(),
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> ShopResult<PaidSession> {
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ShopError::provider("fake", "No such checkout.session"))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct InMemoryContacts {
    contacts: Mutex<HashMap<String, Contact>>,
    fail: AtomicBool,
}

impl InMemoryContacts {
    pub fn with_contact(self, email: &str, id: u64, list_ids: Vec<u64>) -> Self {
        self.contacts.lock().unwrap().insert(
            email.to_string(),
            Contact {
                id,
                email: Some(email.to_string()),
                list_ids,
            },
        );
        self
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn lists_of(&self, email: &str) -> Option<Vec<u64>> {
        self.contacts
            .lock()
            .unwrap()
            .get(email)
            .map(|c| c.list_ids.clone())
    }

    fn check(&self) -> ShopResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ShopError::provider("contacts", "unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactDirectory for InMemoryContacts {
    async fn find_contact(&self, email: &str) -> ShopResult<Option<Contact>> {
        self.check()?;
        Ok(self.contacts.lock().unwrap().get(email).cloned())
    }

    async fn create_contact(&self, email: &str, list_id: u64) -> ShopResult<()> {
        self.check()?;
        let mut contacts = self.contacts.lock().unwrap();
        let id = contacts.len() as u64 + 1;
        contacts.insert(
            email.to_string(),
            Contact {
                id,
                email: Some(email.to_string()),
                list_ids: vec![list_id],
            },
        );
        Ok(())
    }

    async fn add_to_list(&self, contact_id: u64, list_id: u64) -> ShopResult<()> {
        self.check()?;
        let mut contacts = self.contacts.lock().unwrap();
        let contact = contacts
            .values_mut()
            .find(|c| c.id == contact_id)
            .ok_or_else(|| ShopError::provider("contacts", "no such contact"))?;
        contact.list_ids.push(list_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Poll until `count` emails went out; background fulfillment is not awaited by handlers.
    pub async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> ShopResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ShopError::provider("mailer", "rejected"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub fn catalog() -> Catalog {
    Catalog::default()
        .with_item(Item::new(1, "Learn CSS Today", 1500, "css.pdf", 2))
        .with_item(Item::new(2, "JavaScript Simplified", 2500, "js.pdf", 3))
        .with_item(Item::new(3, "React Simplified", 4500, "react.pdf", 4))
}

pub fn config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 3000,
        server_url: SERVER_URL.to_string(),
        client_url: CLIENT_URL.to_string(),
        environment: "test".to_string(),
        public_dir: PathBuf::from("public"),
        catalog_path: None,
        link_ttl: Duration::from_secs(600),
        sweep_interval: Duration::from_secs(60),
    }
}

/// Running test server plus handles on its fake providers
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub payments: Arc<FakePayments>,
    pub contacts: Arc<InMemoryContacts>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(
            FakePayments::default(),
            InMemoryContacts::default(),
            RecordingMailer::default(),
        )
    }

    pub fn with(
        payments: FakePayments,
        contacts: InMemoryContacts,
        mailer: RecordingMailer,
    ) -> Self {
        let payments = Arc::new(payments);
        let contacts = Arc::new(contacts);
        let mailer = Arc::new(mailer);

        let state = AppState::from_parts(
            config(),
            catalog(),
            payments.clone(),
            contacts.clone(),
            mailer.clone(),
        );
        let server = TestServer::new(create_router(state.clone())).unwrap();

        Self {
            server,
            state,
            payments,
            contacts,
            mailer,
        }
    }
}

/// Pull the download code out of a delivery email body
pub fn codes_in(message: &EmailMessage) -> Vec<String> {
    let marker = format!("{}/download/", SERVER_URL);
    message
        .text
        .split_whitespace()
        .filter_map(|word| word.strip_prefix(&marker))
        .map(str::to_string)
        .collect()
}

/// `Cookie` request header value that sends back the `email` cookie a response set.
///
/// The value stays exactly as it came over the wire (percent-encoded).
pub fn echo_email_cookie(response: &TestResponse) -> String {
    format!("email={}", response.cookie("email").value())
}

/// Ids flagged `purchased` in a `/items` response
pub async fn purchased_ids(server: &TestServer, cookie: &str) -> Vec<u64> {
    let response = server.get("/items").add_header("Cookie", cookie).await;
    response.assert_status_ok();

    response
        .json::<Value>()
        .as_array()
        .unwrap()
        .iter()
        .filter(|item| item["purchased"] == Value::Bool(true))
        .map(|item| item["id"].as_u64().unwrap())
        .collect()
}
