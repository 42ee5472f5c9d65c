//! End-to-end smoke test for relay-node.
//!
//! Starts a real node process against a minimal two-chain config and drives
//! it entirely through the REST control API: create a swap, read it back,
//! check health and metrics.
//!
//! Run with:
//!   cargo test -p relay-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
    config_path: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
        let _ = std::fs::remove_file(&self.config_path);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_config(path: &PathBuf, api_port: u16) {
    let config = serde_json::json!({
        "chains": [
            {
                "id": "evm-1",
                "kind": "evm",
                "native_denom": "wei",
                "addr_prefix": null,
                "block_time": 12,
                "required_confirmations": 6,
                "endpoints": ["http://127.0.0.1:1"]
            },
            {
                "id": "osmosis-1",
                "kind": "cosmos",
                "native_denom": "uosmo",
                "addr_prefix": null,
                "block_time": 6,
                "required_confirmations": 2,
                "endpoints": ["http://127.0.0.1:1"]
            }
        ],
        "channels": [
            {
                "source_chain": "evm-1",
                "dest_chain": "osmosis-1",
                "port_id": "transfer",
                "channel_id": "channel-0",
                "ordering": "unordered",
                "version": "ics20-1"
            }
        ],
        "shield": { "trusted_ips": ["127.0.0.1"], "blocked_ips": [], "resource_threshold": 0.9 },
        "api_listen": format!("127.0.0.1:{api_port}")
    });
    std::fs::write(path, serde_json::to_vec_pretty(&config).unwrap()).unwrap();
}

async fn wait_for_health(client: &reqwest::Client, base: &str) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(resp) = client.get(format!("{base}/health")).send().await {
            if resp.status().is_success() || resp.status().as_u16() == 503 {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("relay-node never came up");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn spawn_node(data_dir: PathBuf, config_path: PathBuf, api_port: u16) -> NodeGuard {
    write_config(&config_path, api_port);
    let bin = env!("CARGO_BIN_EXE_relay-node");
    let child = Command::new(bin)
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--config")
        .arg(&config_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn relay-node");
    NodeGuard {
        child,
        data_dir,
        config_path,
    }
}

#[tokio::test]
async fn create_and_fetch_swap_over_rest() {
    let api_port = free_port();
    let mut data_dir = std::env::temp_dir();
    data_dir.push(format!("relay-node-smoke-{api_port}"));
    let mut config_path = std::env::temp_dir();
    config_path.push(format!("relay-node-smoke-{api_port}.json"));

    let _guard = spawn_node(data_dir, config_path, api_port);
    let base = format!("http://127.0.0.1:{api_port}");
    let client = reqwest::Client::new();
    wait_for_health(&client, &base).await;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let create_body = serde_json::json!({
        "sourceChainId": "evm-1",
        "destChainId": "osmosis-1",
        "sourceAddress": "0x1111111111111111111111111111111111111111",
        "destAddress": "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
        "sourceToken": "wei",
        "destToken": "uosmo",
        "amountValue": "1000000",
        "amountDecimals": 6,
        "amountSymbol": "uosmo",
        "hashlock": hex::encode([7u8; 32]),
        "secretAlgo": "sha256",
        "slippageBps": 50,
        "deadline": now + 7_200
    });

    let resp = client
        .post(format!("{base}/swaps"))
        .json(&create_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let created: serde_json::Value = resp.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "Pending");

    let fetched: serde_json::Value = client
        .get(format!("{base}/swaps/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["status"], "Pending");

    let metrics = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("relay_swaps_created_total"));
}

#[tokio::test]
async fn rejects_swap_with_same_source_and_dest_chain() {
    let api_port = free_port();
    let mut data_dir = std::env::temp_dir();
    data_dir.push(format!("relay-node-smoke-samechain-{api_port}"));
    let mut config_path = std::env::temp_dir();
    config_path.push(format!("relay-node-smoke-samechain-{api_port}.json"));

    let _guard = spawn_node(data_dir, config_path, api_port);
    let base = format!("http://127.0.0.1:{api_port}");
    let client = reqwest::Client::new();
    wait_for_health(&client, &base).await;

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let create_body = serde_json::json!({
        "sourceChainId": "evm-1",
        "destChainId": "evm-1",
        "sourceAddress": "0x1111111111111111111111111111111111111111",
        "destAddress": "0x2222222222222222222222222222222222222222",
        "sourceToken": "wei",
        "destToken": "wei",
        "amountValue": "1000000",
        "amountDecimals": 6,
        "amountSymbol": "wei",
        "hashlock": hex::encode([7u8; 32]),
        "secretAlgo": "sha256",
        "slippageBps": 50,
        "deadline": now + 7_200
    });

    let resp = client
        .post(format!("{base}/swaps"))
        .json(&create_body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}
