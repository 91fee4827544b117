//! Integration tests for the onboarding flow API.
//!
//! Each test spins up an Axum server on a random port and drives the real
//! REST contract with reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;

use ploxi_onboard::error::SubmissionError;
use ploxi_onboard::flows::{FlowManager, FlowServices};
use ploxi_onboard::handoff::{HandoffStore, LibSqlStore, MemoryStore, Slot};
use ploxi_onboard::routes::flow_routes;
use ploxi_onboard::wizard::SubmitEffect;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Records every submission instead of posting it.
#[derive(Default)]
struct RecordingSubmitter {
    calls: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl SubmitEffect for RecordingSubmitter {
    async fn submit(&self, endpoint: &str, payload: &Value) -> Result<(), SubmissionError> {
        self.calls
            .lock()
            .await
            .push((endpoint.to_string(), payload.clone()));
        Ok(())
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    store: HandoffStore,
    submitter: Arc<RecordingSubmitter>,
}

/// Start an Axum server on a random port.
async fn start_server() -> TestServer {
    let durable = LibSqlStore::new_memory().await.unwrap();
    let store = HandoffStore::new(Arc::new(MemoryStore::new()), Arc::new(durable));
    let submitter = Arc::new(RecordingSubmitter::default());
    let flows = Arc::new(FlowManager::new(FlowServices {
        store: store.clone(),
        submitter: submitter.clone(),
    }));
    let app = flow_routes(flows);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        store,
        submitter,
    }
}

impl TestServer {
    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut request = self.client.request(method, format!("{}{}", self.base, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        self.send(reqwest::Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(reqwest::Method::PATCH, path, Some(body)).await
    }

    /// Mount a flow and return its id.
    async fn mount(&self, visitor: &str, flow: &str) -> String {
        let (status, body) = self
            .post("/api/flows", json!({"visitorId": visitor, "flow": flow}))
            .await;
        assert_eq!(status, 201, "mount {flow}: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn edit(&self, id: &str, fields: Value) -> Value {
        let (status, body) = self.patch(&format!("/api/flows/{id}/fields"), fields).await;
        assert_eq!(status, 200, "patch: {body}");
        body
    }

    async fn advance(&self, id: &str) -> (u16, Value) {
        self.post(&format!("/api/flows/{id}/advance"), json!({})).await
    }
}

#[tokio::test]
async fn health_and_catalog() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, body) = server.get("/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");

        let (status, catalog) = server.get("/api/catalog").await;
        assert_eq!(status, 200);
        assert_eq!(catalog["solutionTypes"].as_array().unwrap().len(), 10);
        assert_eq!(catalog["esgLocations"][0]["id"], "india");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn cleantech_funding_hands_off_to_finance() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.mount("visitor-1", "cleantech").await;

        // Step 1 blocked until every selection is made
        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 422);
        assert_eq!(body["flow"]["step"], 1);
        assert_eq!(
            body["flow"]["errors"]["industries"],
            "Please select at least one industry"
        );

        server
            .edit(
                &id,
                json!({
                    "solutionTypes": ["energy"],
                    "industries": ["Manufacturing"],
                    "geographies": ["IN"],
                }),
            )
            .await;
        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 200);
        assert_eq!(body["flow"]["step"], 2);
        assert_eq!(body["scrollToTop"], true);

        server
            .edit(&id, json!({"pitch": "We cut industrial energy use by a third with retrofit controls."}))
            .await;
        server.advance(&id).await;
        server.edit(&id, json!({"intent": "funding"})).await;

        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 200);
        assert_eq!(body["transition"]["outcome"], "completed");
        assert_eq!(body["flow"]["step"], 999);
        assert_eq!(
            body["flow"]["destination"]["route"],
            "/climate-finance/registration"
        );

        // The finance flow picks the context up on mount
        let finance = server.mount("visitor-1", "climate-finance").await;
        let (status, view) = server.get(&format!("/api/flows/{finance}")).await;
        assert_eq!(status, 200);
        assert_eq!(view["step"], 1);
        assert_eq!(view["form"]["registrationType"], "vendor");
        assert_eq!(view["form"]["solutionTypes"], json!(["energy"]));
        assert_eq!(view["context"]["banner"]["companyName"], "Your Company");
        assert_eq!(
            view["context"]["banner"]["solutionTags"],
            json!(["Energy Management"])
        );

        // Another visitor gets no context
        let other = server.mount("visitor-2", "climate-finance").await;
        let (_, view) = server.get(&format!("/api/flows/{other}")).await;
        assert_eq!(view["step"], 0);
        assert!(view["context"].get("banner").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn registration_type_is_fixed_once_past_selection() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        // Without context the type can only change on step 0
        let id = server.mount("visitor-1", "climate-finance").await;
        let (status, _) = server
            .post(
                &format!("/api/flows/{id}/registration-type"),
                json!({"registrationType": "participant"}),
            )
            .await;
        assert_eq!(status, 200);
        server
            .edit(
                &id,
                json!({"firstName": "Lena", "lastName": "Ortiz", "email": "lena@example.org"}),
            )
            .await;
        let (_, body) = server.advance(&id).await;
        assert_eq!(body["flow"]["step"], 2);

        let (status, body) = server
            .patch(
                &format!("/api/flows/{id}/fields"),
                json!({"registrationType": "vendor"}),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["field"], "registrationType");
        let (_, view) = server.get(&format!("/api/flows/{id}")).await;
        assert_eq!(view["form"]["registrationType"], "participant");
        assert_eq!(view["step"], 2);

        // A vendor handed off from clean-tech starts on step 1 and stays a vendor
        let cleantech = server.mount("visitor-2", "cleantech").await;
        server
            .edit(
                &cleantech,
                json!({
                    "solutionTypes": ["water"],
                    "industries": ["Agriculture"],
                    "geographies": ["IN"],
                }),
            )
            .await;
        server.advance(&cleantech).await;
        server
            .edit(&cleantech, json!({"pitch": "Drip irrigation retrofits that halve water use on smallholder farms."}))
            .await;
        server.advance(&cleantech).await;
        server.edit(&cleantech, json!({"intent": "funding"})).await;
        server.advance(&cleantech).await;

        let vendor = server.mount("visitor-2", "climate-finance").await;
        let (status, body) = server
            .post(&format!("/api/flows/{vendor}/retreat"), json!({}))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["flow"]["step"], 1);
        assert_eq!(body["flow"]["firstStep"], 1);

        let (status, body) = server
            .post(
                &format!("/api/flows/{vendor}/registration-type"),
                json!({"registrationType": "investor"}),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["field"], "registrationType");

        server
            .edit(
                &vendor,
                json!({
                    "fundingStage": "Seed",
                    "fundingAmount": "₹ 1.5 Crore",
                    "fundingPurpose": "Product Development",
                }),
            )
            .await;
        let (status, body) = server.advance(&vendor).await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["flow"]["step"], 2);

        let (status, body) = server
            .patch(
                &format!("/api/flows/{vendor}/fields"),
                json!({"registrationType": "investor"}),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["field"], "registrationType");
        let (_, view) = server.get(&format!("/api/flows/{vendor}")).await;
        assert_eq!(view["form"]["registrationType"], "vendor");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn investor_blocked_at_engagement_step() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.mount("visitor-1", "climate-finance").await;

        let (status, body) = server
            .post(
                &format!("/api/flows/{id}/registration-type"),
                json!({"registrationType": "investor"}),
            )
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["flow"]["step"], 1);

        server
            .edit(
                &id,
                json!({"firstName": "Ravi", "lastName": "Menon", "email": "ravi@fund.example"}),
            )
            .await;
        let (status, _) = server.advance(&id).await;
        assert_eq!(status, 200);

        server.edit(&id, json!({"financeSubType": ["equity"]})).await;
        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 422);
        assert_eq!(body["flow"]["step"], 2);
        assert_eq!(body["flow"]["errors"], json!({"engagementType": "Required"}));

        // Editing the field clears its error
        let view = server.edit(&id, json!({"engagementType": "raise-equity"})).await;
        assert_eq!(view["errors"], json!({}));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn investor_submission_reaches_dashboard() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;
        let id = server.mount("visitor-1", "climate-finance").await;
        server
            .post(
                &format!("/api/flows/{id}/registration-type"),
                json!({"registrationType": "investor"}),
            )
            .await;
        server
            .edit(
                &id,
                json!({"firstName": "Ravi", "lastName": "Menon", "email": "ravi@fund.example"}),
            )
            .await;
        server.advance(&id).await;
        server
            .edit(
                &id,
                json!({"engagementType": "project-finance", "financeSubType": ["debt"]}),
            )
            .await;
        server.advance(&id).await;

        let (_, catalog) = server.get("/api/catalog").await;
        let fund_size = catalog["fundSizes"][0].clone();
        server
            .edit(
                &id,
                json!({"sectorsOfInterest": ["Solar"], "fundSize": fund_size}),
            )
            .await;
        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["flow"]["step"], 4);

        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["flow"]["step"], 999);
        assert_eq!(body["flow"]["submission"]["status"], "succeeded");
        assert_eq!(
            body["flow"]["destination"]["route"],
            "/climate-finance/dashboard"
        );

        let calls = server.submitter.calls.lock().await.clone();
        assert_eq!(calls.len(), 1);
        let (endpoint, payload) = &calls[0];
        assert_eq!(endpoint, "/api/climate-finance/register");
        assert_eq!(payload["userType"], "investor");
        assert_eq!(payload["status"], "pending");

        let investors = server
            .store
            .read_list("visitor-1", Slot::ClimateInvestors)
            .await;
        assert_eq!(investors.len(), 1);
        assert_eq!(investors[0]["id"], payload["id"]);

        // Terminal flows refuse further navigation
        let (status, _) = server.advance(&id).await;
        assert_eq!(status, 409);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn corporate_registration_through_onboarding() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        // Onboarding before registering redirects to the registration page
        let (status, body) = server
            .post("/api/flows", json!({"visitorId": "acme", "flow": "onboarding"}))
            .await;
        assert_eq!(status, 409);
        assert_eq!(body["redirect"], "/register");

        let id = server.mount("acme", "corporate-registration").await;
        server
            .edit(
                &id,
                json!({
                    "companyName": "Acme Cement",
                    "contactPerson": "Priya Shah",
                    "email": "priya@acme.example",
                    "location": "usa",
                    "industry": "steel",
                    "framework": "sasb",
                }),
            )
            .await;
        let (status, body) = server.advance(&id).await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(body["flow"]["destination"]["route"], "/onboarding");

        let (_, link) = server
            .get("/api/visitors/acme/dashboard-link?path=/compliance")
            .await;
        assert_eq!(link["href"], "/dashboard");

        let onboarding = server.mount("acme", "onboarding").await;
        server
            .edit(&onboarding, json!({"onboardingChoice": "manual"}))
            .await;
        let (status, body) = server.advance(&onboarding).await;
        assert_eq!(status, 200, "{body}");
        assert_eq!(
            body["flow"]["destination"]["route"],
            "/dashboard/usa/steel/sasb"
        );

        let (status, link) = server
            .get("/api/visitors/acme/dashboard-link?path=/compliance")
            .await;
        assert_eq!(status, 200);
        assert_eq!(link["href"], "/dashboard/usa/steel/sasb");
        assert_eq!(link["navbarVisible"], true);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn bad_requests() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server().await;

        let (status, _) = server.get("/api/flows/not-a-uuid").await;
        assert_eq!(status, 400);

        let (status, _) = server
            .get("/api/flows/00000000-0000-0000-0000-000000000000")
            .await;
        assert_eq!(status, 404);

        let id = server.mount("visitor-1", "cleantech").await;
        let (status, body) = server
            .patch(&format!("/api/flows/{id}/fields"), json!({"nickname": "x"}))
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["field"], "nickname");

        let (status, _) = server
            .post(
                &format!("/api/flows/{id}/registration-type"),
                json!({"registrationType": "vendor"}),
            )
            .await;
        assert_eq!(status, 409);

        let (status, _) = server
            .send(reqwest::Method::DELETE, &format!("/api/flows/{id}"), None)
            .await;
        assert_eq!(status, 200);
        let (status, _) = server.get(&format!("/api/flows/{id}")).await;
        assert_eq!(status, 404);
    })
    .await
    .expect("test timed out");
}
