use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use storefront_chat::models::{ChatMessage, Role, StrategyReport};
use storefront_chat::persist::{FileFlagStore, FlagStore};
use storefront_chat::policy::{self, PeerLabels};
use storefront_chat::report::fetch_report;
use storefront_chat::session::{ChatSession, SessionConfig};
use storefront_chat::transport::{ConnectConfig, Connection};

/// Deterministic opener shown before any network activity.
const GREETING: &str = "안녕하세요, 고객님.\n고객님께 가장 잘 맞는 제품을 안내해드릴 수 있도록 도와드리겠습니다.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_chat=info".into()),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let endpoint = std::env::var("CHAT_ENDPOINT")
        .unwrap_or_else(|_| "ws://localhost:8000/ws/chat".to_string());
    let role = match std::env::var("CHAT_ROLE") {
        Ok(value) => Role::try_from(value)?,
        Err(_) => Role::Store,
    };
    let labels = PeerLabels {
        customer_name: std::env::var("CHAT_CUSTOMER_LABEL")
            .unwrap_or_else(|_| "최예인님".to_string()),
        brand_name: std::env::var("CHAT_BRAND_LABEL").unwrap_or_else(|_| "Dior".to_string()),
    };
    let report_wait = std::env::var("CHAT_REPORT_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs);
    let flags: Box<dyn FlagStore> = match std::env::var("CHAT_STATE_FILE") {
        Ok(path) => Box::new(FileFlagStore::new(path)),
        Err(_) => Box::new(FileFlagStore::at_default_location()?),
    };

    // ── Chat connection + session ─────────────────────────────────────────────
    let config = SessionConfig { role, endpoint: endpoint.clone() };
    let mut connection = Connection::open(&config.endpoint, ConnectConfig::default()).await?;
    let mut session = ChatSession::new(config, Box::new(connection.outbound()), flags)?;

    session.seed(vec![ChatMessage::new(Role::Store, GREETING)]);

    println!("── {} ──", policy::peer_label(session.role(), &labels));
    for message in session.messages() {
        render(message, session.role(), &labels);
    }
    if session.is_ended() {
        println!("종료된 채팅입니다.");
    }
    println!("(commands: /menu /end /report /quit)");

    // ── Drive: inbound frames and terminal input ──────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            frame = connection.recv() => match frame {
                Some(frame) => {
                    session.append_remote(frame);
                    if let Some(message) = session.messages().last() {
                        render(message, session.role(), &labels);
                    }
                }
                None => {
                    info!("chat connection closed by the server");
                    break;
                }
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "/quit" => break,
                    "/menu" => {
                        session.toggle_menu();
                        if session.menu_open() {
                            for action in policy::available_actions(session.role()) {
                                println!("  · {action}");
                            }
                        }
                    }
                    "/end" => {
                        session.end_session()?;
                        println!("종료된 채팅입니다.");
                        if policy::report_available(session.role(), session.is_ended()) {
                            println!("채팅 분석 리포트 보기: /report");
                        }
                    }
                    "/report" => {
                        if policy::report_available(session.role(), session.is_ended()) {
                            run_report(&endpoint, report_wait).await;
                        } else {
                            println!("리포트는 종료된 채팅에서 매장만 볼 수 있습니다.");
                        }
                    }
                    text => {
                        if session.is_ended() {
                            // Ended chats take no further input.
                            println!("종료된 채팅입니다.");
                        } else if session.append_local(text) {
                            if let Some(message) = session.messages().last() {
                                render(message, session.role(), &labels);
                            }
                        }
                    }
                }
            }
        }
    }

    connection.close().await;
    Ok(())
}

/// One message per bubble, each embedded line on its own terminal row.
fn render(message: &ChatMessage, role: Role, labels: &PeerLabels) {
    let label = if policy::is_mine(message, role) {
        "나"
    } else {
        policy::peer_label(role, labels)
    };
    for line in message.text.split('\n') {
        println!("{label}> {line}");
    }
}

/// The report view: a dedicated connection, one request, one result.
async fn run_report(endpoint: &str, wait: Option<Duration>) {
    let mut connection = match Connection::open(endpoint, ConnectConfig::default()).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!("could not open report connection: {e}");
            return;
        }
    };

    println!("리포트 로딩 중...");
    let outcome = fetch_report(&mut connection, None, wait).await;
    connection.close().await;

    match outcome {
        Ok(report) => render_report(&report),
        Err(e) => warn!("report request failed: {e}"),
    }
}

fn render_report(report: &StrategyReport) {
    println!("── 채팅 분석 리포트 ──");

    println!("핵심 키워드");
    if report.keyword.is_empty() {
        println!("  키워드 없음");
    } else {
        let tags: Vec<String> = report.keyword.iter().map(|k| format!("#{k}")).collect();
        println!("  {}", tags.join(" "));
    }

    println!("대화 전체 요약");
    println!("  {}", report.summary);

    println!("고객 맞춤 마케팅 전략");
    if report.strategy.is_empty() {
        println!("  전략 없음");
    }
    for item in &report.strategy {
        println!("  {item}");
    }

    println!("추천 상품");
    if report.recommended_products.is_empty() {
        println!("  추천 상품 없음");
    }
    for product in &report.recommended_products {
        println!("  {} / {}원", product.name, product.price);
        println!("    {}", product.notes);
    }

    println!("추천 쿠폰");
    if report.recommended_coupons.is_empty() {
        println!("  추천 쿠폰 없음");
    }
    for coupon in &report.recommended_coupons {
        println!("  {} ({})", coupon.title, coupon.valid);
        println!("    {}", coupon.detail);
    }
}
