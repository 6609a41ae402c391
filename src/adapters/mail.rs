use crate::config::toml_config::{OutreachConfig, TransportKind};
use crate::core::{MailTransport, OutgoingEmail};
use crate::utils::error::{OutreachError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// 不寄送，只把內容印到標準輸出
#[derive(Debug, Clone, Default)]
pub struct EchoTransport;

#[async_trait]
impl MailTransport for EchoTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        tracing::debug!("Echoing email to {} instead of sending", email.recipient);
        println!("\n--- TEST EMAIL ---");
        println!("To: {}", email.recipient);
        println!("Subject: {}", email.subject);
        println!("Body:\n{}", email.body);
        println!("--- END TEST EMAIL ---\n");
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Mailbox,
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox> {
    value
        .parse::<Mailbox>()
        .map_err(|e| OutreachError::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: format!("Invalid address: {}", e),
        })
}

impl SmtpMailer {
    pub fn from_config(config: &OutreachConfig) -> Result<Self> {
        let email = &config.email;
        let server = config
            .smtp_server()
            .ok_or_else(|| OutreachError::MissingConfigError {
                field: "email.smtp_server".to_string(),
            })?;
        let sender = config
            .sender_email()
            .ok_or_else(|| OutreachError::MissingConfigError {
                field: "email.sender_email".to_string(),
            })?;

        let mut builder = if email.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server).map_err(|e| {
                OutreachError::ConfigError {
                    message: format!("SMTP relay error for '{}': {}", server, e),
                }
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server)
        };
        builder = builder
            .port(email.smtp_port)
            .timeout(Some(config.email_timeout()));

        // 帳號密碼都有才登入
        if let Some((username, password)) = config.smtp_credentials() {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let from = parse_mailbox(
            "email.sender_email",
            &format!("{} <{}>", email.sender_name, sender),
        )?;
        let reply_to = match email.reply_to.as_deref().filter(|v| !v.trim().is_empty()) {
            Some(reply_to) => parse_mailbox("email.reply_to", reply_to)?,
            None => from.clone(),
        };

        Ok(Self {
            transport: builder.build(),
            from,
            reply_to,
        })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message> {
        let to = email
            .recipient
            .parse::<Mailbox>()
            .map_err(|e| OutreachError::DispatchError {
                recipient: email.recipient.clone(),
                message: format!("Invalid to address: {}", e),
            })?;

        Message::builder()
            .from(self.from.clone())
            .reply_to(self.reply_to.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| OutreachError::DispatchError {
                recipient: email.recipient.clone(),
                message: format!("Failed to build email: {}", e),
            })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| OutreachError::DispatchError {
                recipient: email.recipient.clone(),
                message: format!("SMTP send failed: {}", e),
            })?;
        Ok(())
    }
}

/// 依 email.transport 明確選擇，不從其他設定推斷
pub fn transport_from_config(config: &OutreachConfig) -> Result<Arc<dyn MailTransport>> {
    match config.email.transport {
        TransportKind::Echo => {
            tracing::info!("📭 Mail transport: echo (nothing leaves this machine)");
            Ok(Arc::new(EchoTransport))
        }
        TransportKind::Smtp => {
            tracing::info!(
                "📬 Mail transport: SMTP via {}",
                config.smtp_server().unwrap_or("?")
            );
            Ok(Arc::new(SmtpMailer::from_config(config)?))
        }
    }
}
