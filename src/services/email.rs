use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::config::Config;

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    async fn send_email(
        &self,
        to: Mailbox,
        subject: &str,
        text: &str,
        html: &str,
    ) -> anyhow::Result<()> {
        let email = Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )?;

        self.transport.send(email).await?;
        Ok(())
    }

    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> anyhow::Result<()> {
        let to: Mailbox = to_email.parse()?;
        let text = format!(
            "Hallo,\n\n\
             über diesen Link kannst du dein Passwort zurücksetzen:\n{reset_url}\n\n\
             Der Link ist eine Stunde gültig. Falls du kein neues Passwort angefordert hast, \
             kannst du diese E-Mail ignorieren.\n"
        );
        let html = format!(
            r#"<p>Hallo,</p>
<p>über den folgenden Link kannst du dein Passwort zurücksetzen:</p>
<p><a href="{reset_url}">Passwort zurücksetzen</a></p>
<p>Der Link ist eine Stunde gültig. Falls du kein neues Passwort angefordert hast, kannst du diese E-Mail ignorieren.</p>"#
        );
        self.send_email(to, "Kantine: Passwort zurücksetzen", &text, &html)
            .await
    }
}
