//! Bot lifecycle: building and running the WhatsApp bot.

use super::events::handle_whatsapp_message;
use super::{qr, set_state, WhatsAppChannel};
use courier_core::{error::RelayError, message::IncomingMessage, traits::ConnectionState};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

impl WhatsAppChannel {
    /// Build a WhatsApp bot with the event handler and run it in the background.
    pub(super) async fn build_and_run_bot(
        &self,
        tx: mpsc::Sender<IncomingMessage>,
    ) -> Result<(), RelayError> {
        let db_path = self.session_db_path()?;
        info!("WhatsApp bot building (session: {db_path})...");

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| RelayError::Channel(format!("whatsapp store init failed: {e}")))?,
        );

        let client_handle = self.client.clone();
        let state_handle = self.state_tx.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some("Courier".to_string()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let tx = tx.clone();
                let client_store = client_handle.clone();
                let state = state_handle.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("WhatsApp QR code generated (scan to pair)");
                            debug!("QR data: {code}");
                            match qr::generate_qr_terminal(&code) {
                                Ok(rendered) => println!("{rendered}"),
                                Err(e) => warn!("{e}"),
                            }
                        }
                        Event::PairSuccess(_) => {
                            info!("WhatsApp pairing successful");
                        }
                        Event::Connected(_) => {
                            *client_store.lock().await = Some(client);
                            set_state(&state, ConnectionState::Ready);
                        }
                        Event::Disconnected(_) => {
                            warn!("WhatsApp disconnected");
                            set_state(&state, ConnectionState::Disconnected);
                        }
                        Event::LoggedOut(_) => {
                            warn!("WhatsApp logged out, session invalidated; re-pair required");
                            *client_store.lock().await = None;
                            set_state(&state, ConnectionState::AuthFailed);
                        }
                        Event::Message(msg, info) => {
                            handle_whatsapp_message(*msg, info, &tx).await;
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| RelayError::Channel(format!("whatsapp bot build failed: {e}")))?;

        // Store client reference immediately; sends are still gated on state.
        *self.client.lock().await = Some(bot.client());

        // Run bot in background.
        let _handle = bot
            .run()
            .await
            .map_err(|e| RelayError::Channel(format!("whatsapp bot run failed: {e}")))?;

        info!("WhatsApp bot started");
        Ok(())
    }
}
