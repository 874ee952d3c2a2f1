//! Mint a development bearer token.
//!
//! Usage: `mint-token [user_id]`. Reads `JWT_SECRET` from the environment
//! (a `.env` file is honored), falls back to the development secret, and
//! prints a token valid for 30 days.

use agentloom::auth::issue_token;
use chrono::Duration;

fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();

    let user_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "user_123".to_string());
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-key".to_string());

    let token = issue_token(&user_id, &secret, Duration::days(30))?;
    println!("{token}");
    Ok(())
}
