#![allow(dead_code)]

use std::future::Future;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

/// Answers `(method, params)` with a JSON-RPC `result` or an `error` object.
pub type Handler = dyn Fn(&str, &Value) -> Result<Value, Value> + Send + Sync;

pub struct MockNode {
    pub url: String,
    pub calls: Arc<Mutex<Vec<String>>>,
}

pub fn spawn_rpc_server(handler: Arc<Handler>) -> MockNode {
    let server = Server::http("127.0.0.1:0").expect("start server");
    let url = format!("http://{}", server.server_addr());
    let calls = Arc::new(Mutex::new(Vec::<String>::new()));
    let recorded = Arc::clone(&calls);

    thread::spawn(move || {
        for _ in 0..64 {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut body = String::new();
            let _ = req.as_reader().read_to_string(&mut body);
            let request: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            let method = request["method"].as_str().unwrap_or_default().to_owned();
            if let Ok(mut g) = recorded.lock() {
                g.push(method.clone());
            }

            let payload = match handler(&method, &request["params"]) {
                Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
                Err(error) => json!({"jsonrpc": "2.0", "id": request["id"], "error": error}),
            };
            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(200));
            let _ = req.respond(response);
        }
    });

    MockNode { url, calls }
}

/// A node that knows `net_version`, `eth_accounts` and `eth_requestAccounts`.
pub fn spawn_wallet_node(network: Arc<Mutex<String>>, accounts: Vec<&'static str>) -> MockNode {
    spawn_rpc_server(Arc::new(move |method: &str, _params: &Value| match method {
        "net_version" => Ok(json!(network.lock().expect("network lock").clone())),
        "eth_accounts" | "eth_requestAccounts" => Ok(json!(accounts)),
        "eth_blockNumber" => Ok(json!("0x10")),
        _ => Err(json!({"code": -32601, "message": "method not found"})),
    }))
}

/// Drives an async port call natively. Adapters are built outside the
/// runtime: their blocking clients must not be created inside one.
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
        .block_on(future)
}

pub const WALLET: &str = "0x1000000000000000000000000000000000000001";
pub const NODE: &str = "0x2000000000000000000000000000000000000002";
