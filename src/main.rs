//! slirc-bot - demo client for the slirc engine.
//!
//! Connects to the configured server, registers, joins channels, answers
//! PINGs, and logs what it is told. Exits when the connection ends.

use slirc_client::config::{BotConfig, IdentityConfig};
use slirc_client::{Config, KeepAlive, Message, Plugin, Service, Session, SessionError};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Registers on connect, joins on welcome, stops the service on disconnect.
struct Greeter {
    identity: IdentityConfig,
    bot: BotConfig,
}

impl Plugin for Greeter {
    fn on_connect(&self, session: &Session) {
        let nick = format!("NICK {}", self.identity.nick);
        let user = format!(
            "USER {} 0 * :{}",
            self.identity.user, self.identity.realname
        );
        for line in [nick, user] {
            if let Err(e) = session.write(line) {
                warn!(error = %e, "registration write failed");
            }
        }
    }

    fn on_welcome(&self, session: &Session, message: &Message) {
        info!(server = ?message.source(), "registered");
        for channel in &self.bot.channels {
            if let Err(e) = session.write(format!("JOIN {channel}")) {
                warn!(channel = %channel, error = %e, "join failed");
            }
        }
    }

    fn on_privmsg(&self, _session: &Session, message: &Message) {
        info!(
            from = message.source_nickname().unwrap_or("?"),
            target = message.params.first().map(String::as_str).unwrap_or("?"),
            text = message.text().unwrap_or_default(),
            "privmsg"
        );
    }

    fn on_notice(&self, _session: &Session, message: &Message) {
        info!(
            from = message.source().unwrap_or("?"),
            text = message.text().unwrap_or_default(),
            "notice"
        );
    }

    fn on_error(&self, _session: &Session, message: &Message) {
        warn!(reason = message.text().unwrap_or_default(), "server error");
    }

    fn on_fault(&self, session: &Session, error: &SessionError) {
        error!(error = %error, code = error.error_code(), "session fault");
        // Resolution and connection failures never reach on_disconnect.
        session.service().stop();
    }

    fn on_disconnect(&self, session: &Session) {
        info!("connection closed, stopping");
        session.service().stop();
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;
    config.validate()?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        nick = %config.identity.nick,
        "Starting slirc-bot"
    );

    let service = Service::from_config(&config)?;
    service.plugins().add(Arc::new(KeepAlive));
    service.plugins().add(Arc::new(Greeter {
        identity: config.identity.clone(),
        bot: config.bot.clone(),
    }));

    let session = service.connect(
        config.server.host.clone(),
        config.server.port,
        Vec::<Arc<dyn Plugin>>::new(),
    );

    service.run();

    session.destroy();
    info!("Shutdown complete");
    Ok(())
}
