//! A runnable relay with no rules: every action is legal.
//!
//! Useful for poking at the protocol with a WebSocket client without
//! wiring up a real rules engine. The "position" is just the list of
//! accepted actions, and turns alternate strictly.

use gambit_room::{Accepted, Oracle, TerminalFlags};
use gambit_server::RelayServerBuilder;
use gambit_wire::{Action, Side};

struct FreeOracle;

impl Oracle for FreeOracle {
    fn initial_position(&self) -> String {
        String::new()
    }

    fn turn(&self, position: &str) -> Side {
        if position.split_whitespace().count() % 2 == 0 {
            Side::First
        } else {
            Side::Second
        }
    }

    fn apply(&self, position: &str, action: &Action) -> Result<Accepted, String> {
        let entry = format!("{}-{}", action.from, action.to);
        let position = if position.is_empty() {
            entry
        } else {
            format!("{position} {entry}")
        };
        Ok(Accepted {
            position,
            terminal: TerminalFlags::default(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".into());
    let server = RelayServerBuilder::new()
        .bind(&format!("0.0.0.0:{port}"))
        .build(FreeOracle)
        .await?;

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_oracle_alternates_turns() {
        let oracle = FreeOracle;
        let p0 = oracle.initial_position();
        assert_eq!(oracle.turn(&p0), Side::First);

        let a = Action {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
        };
        let p1 = oracle.apply(&p0, &a).unwrap().position;
        assert_eq!(p1, "e2-e4");
        assert_eq!(oracle.turn(&p1), Side::Second);
    }

    #[test]
    fn test_free_oracle_accumulates_actions() {
        let oracle = FreeOracle;
        let a = Action {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
        };
        let b = Action {
            from: "e7".into(),
            to: "e5".into(),
            promotion: None,
        };
        let p1 = oracle.apply("", &a).unwrap().position;
        let p2 = oracle.apply(&p1, &b).unwrap().position;
        assert_eq!(p2, "e2-e4 e7-e5");
    }
}
