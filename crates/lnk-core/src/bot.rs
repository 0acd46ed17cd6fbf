//! Message handling: utility commands and per-URL shortening.
//!
//! Each inbound message is handled to completion before the handler returns:
//! URLs are shortened one at a time in discovery order. A failure on one URL is
//! logged and never stops the next one.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    alias::AliasStrategy,
    commands::{parse_command, Command},
    config::Config,
    domain::IncomingMessage,
    formatting::{format_help, format_link_reply, format_pong},
    links::{extract_urls, hostname},
    messaging::port::MessagingPort,
    shorten::{ShortenResult, ShorteningClient},
};

/// What happened to a single URL found in a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UrlOutcome {
    /// Shortened and answered with a reply.
    Shortened {
        url: String,
        short_url: String,
        domain: String,
    },
    /// The service rejected the URL (after the alias fallback, if any).
    Failed { url: String, reason: String },
    /// Skipped before or during submission (bad URL, no alias, transport error).
    Aborted { url: String, error: String },
}

impl UrlOutcome {
    pub fn url(&self) -> &str {
        match self {
            UrlOutcome::Shortened { url, .. }
            | UrlOutcome::Failed { url, .. }
            | UrlOutcome::Aborted { url, .. } => url,
        }
    }
}

/// Summary of one `handle_message` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageReport {
    /// The author is a bot; nothing else was done.
    pub ignored: bool,
    pub command: Option<Command>,
    /// The message was in the shortening channel and was scanned for URLs.
    pub scanned: bool,
    pub outcomes: Vec<UrlOutcome>,
}

pub struct LinkBot {
    cfg: Arc<Config>,
    alias: Arc<dyn AliasStrategy>,
    shortener: ShorteningClient,
}

impl LinkBot {
    pub fn new(
        cfg: Arc<Config>,
        alias: Arc<dyn AliasStrategy>,
        shortener: ShorteningClient,
    ) -> Self {
        Self {
            cfg,
            alias,
            shortener,
        }
    }

    /// Entry point for every inbound chat message.
    ///
    /// Command handling and URL scanning are independent: a prefixed message in
    /// the shortening channel gets both.
    pub async fn handle_message(
        &self,
        msg: &IncomingMessage,
        messenger: &dyn MessagingPort,
    ) -> MessageReport {
        let mut report = MessageReport::default();

        if msg.author_is_bot {
            report.ignored = true;
            return report;
        }

        if let Some(parsed) = parse_command(&self.cfg.command_prefix, &msg.text) {
            report.command = Command::from_name(&parsed.name);
            match report.command {
                Some(cmd) => self.run_command(cmd, msg, messenger).await,
                None => tracing::debug!(command = %parsed.name, "ignoring unknown command"),
            }
        }

        if msg.chat_id() == self.cfg.shorten_chat_id {
            report.scanned = true;
            for url in extract_urls(&msg.text) {
                let outcome = self.process_url(&url, msg, messenger).await;
                report.outcomes.push(outcome);
            }
        }

        report
    }

    async fn run_command(
        &self,
        cmd: Command,
        msg: &IncomingMessage,
        messenger: &dyn MessagingPort,
    ) {
        let html = match cmd {
            Command::Ping => {
                let latency = Utc::now().signed_duration_since(msg.sent_at);
                format_pong(latency.num_milliseconds())
            }
            Command::Help => format_help(&self.cfg.command_prefix),
        };

        if let Err(e) = messenger.reply_html(msg.source, &html).await {
            tracing::warn!(command = ?cmd, error = %e, "command reply failed");
        }
    }

    async fn process_url(
        &self,
        url: &str,
        msg: &IncomingMessage,
        messenger: &dyn MessagingPort,
    ) -> UrlOutcome {
        let domain = match hostname(url) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(%url, error = %e, "skipping unparsable url");
                return UrlOutcome::Aborted {
                    url: url.to_string(),
                    error: e.to_string(),
                };
            }
        };

        let alias = match self.alias.alias_for(url).await {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(
                    %url,
                    mode = %self.alias.mode(),
                    error = %e,
                    "no alias; skipping url"
                );
                return UrlOutcome::Aborted {
                    url: url.to_string(),
                    error: e.to_string(),
                };
            }
        };

        let result = match self.shortener.shorten(url, alias).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(%url, error = %e, "shortening service call failed");
                return UrlOutcome::Aborted {
                    url: url.to_string(),
                    error: e.to_string(),
                };
            }
        };

        match result {
            ShortenResult::Failure { reason } => {
                tracing::error!(%url, %reason, "error shortening url");
                UrlOutcome::Failed {
                    url: url.to_string(),
                    reason,
                }
            }
            ShortenResult::Success { short_url } => {
                tracing::info!(%url, %short_url, %domain, "shortened url");
                let html = format_link_reply(url, &short_url, &domain, Utc::now());
                if let Err(e) = messenger.reply_html(msg.source, &html).await {
                    tracing::warn!(%url, error = %e, "reply failed");
                }
                UrlOutcome::Shortened {
                    url: url.to_string(),
                    short_url,
                    domain,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alias::{build_alias, Alias, AliasMode, NoAlias},
        domain::{ChatId, MessageId, MessageRef},
        errors::Error,
        ports::ShortenApi,
        shorten::{ApiResponse, ShortenRequest},
        Result,
    };
    use async_trait::async_trait;
    use std::{collections::HashMap, io, sync::Mutex};

    const CHANNEL: i64 = -1001;
    const OTHER_CHAT: i64 = 77;

    fn cfg() -> Arc<Config> {
        let map: HashMap<&str, &str> = [
            ("BOT_TOKEN", "123:abc"),
            ("SHORTEN_CHANNEL_ID", "-1001"),
            ("API_TOKEN", "secret"),
        ]
        .into_iter()
        .collect();
        Arc::new(Config::from_lookup(|k| map.get(k).map(|v| v.to_string())).unwrap())
    }

    #[derive(Default)]
    struct FakeMessenger {
        replies: Mutex<Vec<(MessageRef, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn reply_html(&self, to: MessageRef, html: &str) -> Result<MessageRef> {
            self.replies.lock().unwrap().push((to, html.to_string()));
            if self.fail {
                return Err(Error::External("chat unavailable".to_string()));
            }
            Ok(to)
        }
    }

    /// Answers per original URL; records every request.
    #[derive(Default)]
    struct FakeApi {
        script: Mutex<HashMap<String, Vec<Result<ApiResponse>>>>,
        requests: Mutex<Vec<ShortenRequest>>,
    }

    impl FakeApi {
        fn answer(self, url: &str, answers: Vec<Result<ApiResponse>>) -> Self {
            self.script.lock().unwrap().insert(url.to_string(), answers);
            self
        }

        fn requests(&self) -> Vec<ShortenRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ShortenApi for FakeApi {
        async fn submit(&self, req: &ShortenRequest) -> Result<ApiResponse> {
            self.requests.lock().unwrap().push(req.clone());
            let mut script = self.script.lock().unwrap();
            match script.get_mut(&req.original_url) {
                Some(answers) if !answers.is_empty() => answers.remove(0),
                _ => Err(Error::External("unexpected request".to_string())),
            }
        }
    }

    struct FixedAlias(&'static str);

    #[async_trait]
    impl AliasStrategy for FixedAlias {
        fn mode(&self) -> AliasMode {
            AliasMode::Filename
        }

        async fn alias_for(&self, _url: &str) -> Result<Option<Alias>> {
            Ok(Some(build_alias(self.0)))
        }
    }

    struct BrokenAlias;

    #[async_trait]
    impl AliasStrategy for BrokenAlias {
        fn mode(&self) -> AliasMode {
            AliasMode::Filename
        }

        async fn alias_for(&self, url: &str) -> Result<Option<Alias>> {
            Err(Error::FilenameUnresolved(url.to_string()))
        }
    }

    fn ok(short: &str) -> Result<ApiResponse> {
        Ok(ApiResponse {
            status: "success".to_string(),
            shortened_url: Some(short.to_string()),
            message: None,
        })
    }

    fn err(message: &str) -> Result<ApiResponse> {
        Ok(ApiResponse {
            status: "error".to_string(),
            shortened_url: None,
            message: Some(message.to_string()),
        })
    }

    fn message(chat: i64, text: &str, author_is_bot: bool) -> IncomingMessage {
        IncomingMessage {
            source: MessageRef {
                chat_id: ChatId(chat),
                message_id: MessageId(10),
            },
            author_is_bot,
            author_name: Some("alice".to_string()),
            text: text.to_string(),
            sent_at: Utc::now(),
        }
    }

    /// Shared buffer the test subscriber writes formatted events into.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn error_lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .filter(|l| l.contains("ERROR"))
                .map(|l| l.to_string())
                .collect()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        (buf, tracing::subscriber::set_default(subscriber))
    }

    fn bot(api: Arc<FakeApi>, alias: Arc<dyn AliasStrategy>) -> LinkBot {
        LinkBot::new(cfg(), alias, ShorteningClient::new(api))
    }

    #[tokio::test]
    async fn shortens_url_in_channel_and_replies_once() {
        let api = Arc::new(
            FakeApi::default().answer("https://example.com/a.zip", vec![ok("https://gplinks.co/a")]),
        );
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let msg = message(CHANNEL, "check https://example.com/a.zip", false);
        let report = b.handle_message(&msg, &messenger).await;

        assert_eq!(api.requests().len(), 1);
        assert_eq!(api.requests()[0].original_url, "https://example.com/a.zip");
        assert_eq!(
            report.outcomes,
            vec![UrlOutcome::Shortened {
                url: "https://example.com/a.zip".to_string(),
                short_url: "https://gplinks.co/a".to_string(),
                domain: "example.com".to_string(),
            }]
        );

        let replies = messenger.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, msg.source);
        assert!(replies[0].1.contains("example.com"));
        assert!(replies[0].1.contains("https://gplinks.co/a"));
    }

    #[tokio::test]
    async fn bot_authors_are_ignored() {
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(CHANNEL, "https://example.com/a.zip", true), &messenger)
            .await;

        assert!(report.ignored);
        assert!(api.requests().is_empty());
        assert!(messenger.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ping_replies_without_scanning_outside_channel() {
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(OTHER_CHAT, "u!ping", false), &messenger)
            .await;

        assert_eq!(report.command, Some(Command::Ping));
        assert!(!report.scanned);
        assert!(api.requests().is_empty());
        let replies = messenger.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].1.contains("Pong"));
    }

    #[tokio::test]
    async fn ping_in_channel_issues_no_shortening() {
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(CHANNEL, "u!ping", false), &messenger)
            .await;

        assert_eq!(report.command, Some(Command::Ping));
        assert!(report.outcomes.is_empty());
        assert!(api.requests().is_empty());
        assert_eq!(messenger.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn urls_outside_channel_are_not_scanned() {
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(OTHER_CHAT, "https://example.com/a.zip", false), &messenger)
            .await;

        assert!(!report.scanned);
        assert!(api.requests().is_empty());
        assert!(messenger.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn command_and_scan_both_fire() {
        let api = Arc::new(
            FakeApi::default().answer("https://example.com/x", vec![ok("https://gplinks.co/x")]),
        );
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(CHANNEL, "u!help https://example.com/x", false), &messenger)
            .await;

        assert_eq!(report.command, Some(Command::Help));
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(messenger.replies.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn service_failure_is_silent_and_does_not_stop_later_urls() {
        let api = Arc::new(
            FakeApi::default()
                .answer("https://bad.com/1", vec![err("Invalid URL")])
                .answer("https://good.com/2", vec![ok("https://gplinks.co/2")]),
        );
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(
                &message(CHANNEL, "https://bad.com/1 https://good.com/2", false),
                &messenger,
            )
            .await;

        let urls: Vec<String> = api.requests().into_iter().map(|r| r.original_url).collect();
        assert_eq!(urls, vec!["https://bad.com/1", "https://good.com/2"]);
        assert_eq!(
            report.outcomes[0],
            UrlOutcome::Failed {
                url: "https://bad.com/1".to_string(),
                reason: "Invalid URL".to_string(),
            }
        );
        assert!(matches!(report.outcomes[1], UrlOutcome::Shortened { .. }));

        let replies = messenger.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].1.contains("good.com"));
    }

    #[tokio::test]
    async fn every_unshortened_url_logs_an_error() {
        let (logs, _guard) = capture_logs();
        let api = Arc::new(
            FakeApi::default()
                .answer("https://bad.com/1", vec![err("Invalid URL")])
                .answer("https://good.com/2", vec![ok("https://gplinks.co/2")]),
        );
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        // bad.com answers with a service error; lost.com has no scripted answer
        // and fails like a transport error; good.com succeeds.
        let report = b
            .handle_message(
                &message(
                    CHANNEL,
                    "https://bad.com/1 https://lost.com/3 https://good.com/2",
                    false,
                ),
                &messenger,
            )
            .await;

        assert!(matches!(report.outcomes[0], UrlOutcome::Failed { .. }));
        assert!(matches!(report.outcomes[1], UrlOutcome::Aborted { .. }));
        assert!(matches!(report.outcomes[2], UrlOutcome::Shortened { .. }));

        let errors = logs.error_lines();
        assert!(
            errors
                .iter()
                .any(|l| l.contains("https://bad.com/1") && l.contains("Invalid URL")),
            "{errors:?}"
        );
        assert!(
            errors
                .iter()
                .any(|l| l.contains("https://lost.com/3") && l.contains("unexpected request")),
            "{errors:?}"
        );
        assert!(
            !errors.iter().any(|l| l.contains("https://good.com/2")),
            "{errors:?}"
        );
    }

    #[tokio::test]
    async fn aborted_urls_log_an_error_before_any_request() {
        let (logs, _guard) = capture_logs();
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(BrokenAlias));

        let report = b
            .handle_message(&message(CHANNEL, "https://example.com/ https://[::1", false), &messenger)
            .await;

        assert_eq!(report.outcomes.len(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o, UrlOutcome::Aborted { .. })));
        assert!(api.requests().is_empty());

        let errors = logs.error_lines();
        assert!(
            errors.iter().any(|l| l.contains("https://example.com/")
                && l.contains("could not resolve a filename")),
            "{errors:?}"
        );
        assert!(
            errors
                .iter()
                .any(|l| l.contains("https://[::1") && l.contains("invalid url")),
            "{errors:?}"
        );
    }

    #[tokio::test]
    async fn collision_retry_result_is_replied() {
        let url = "https://example.com/files/report.pdf";
        let api = Arc::new(FakeApi::default().answer(
            url,
            vec![err("Alias already exists"), ok("https://gplinks.co/r")],
        ));
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(FixedAlias("My File.pdf")));

        let report = b
            .handle_message(&message(CHANNEL, url, false), &messenger)
            .await;

        let reqs = api.requests();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].alias.as_ref().map(Alias::as_str), Some("My_File"));
        assert_eq!(reqs[1].alias, None);
        assert!(matches!(report.outcomes[0], UrlOutcome::Shortened { .. }));
        assert_eq!(messenger.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn alias_failure_skips_the_url() {
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(BrokenAlias));

        let report = b
            .handle_message(&message(CHANNEL, "https://example.com/", false), &messenger)
            .await;

        assert!(matches!(report.outcomes[0], UrlOutcome::Aborted { .. }));
        assert!(api.requests().is_empty());
        assert!(messenger.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_contained() {
        // No scripted answer: the fake API returns a transport-style error.
        let api = Arc::new(FakeApi::default());
        let messenger = FakeMessenger::default();
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(CHANNEL, "https://example.com/a", false), &messenger)
            .await;

        assert_eq!(api.requests().len(), 1);
        assert_eq!(report.outcomes[0].url(), "https://example.com/a");
        assert!(matches!(report.outcomes[0], UrlOutcome::Aborted { .. }));
        assert!(messenger.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_failure_does_not_stop_processing() {
        let api = Arc::new(
            FakeApi::default()
                .answer("https://a.com/1", vec![ok("https://gplinks.co/1")])
                .answer("https://b.com/2", vec![ok("https://gplinks.co/2")]),
        );
        let messenger = FakeMessenger {
            fail: true,
            ..Default::default()
        };
        let b = bot(api.clone(), Arc::new(NoAlias));

        let report = b
            .handle_message(&message(CHANNEL, "https://a.com/1 https://b.com/2", false), &messenger)
            .await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(messenger.replies.lock().unwrap().len(), 2);
    }
}
