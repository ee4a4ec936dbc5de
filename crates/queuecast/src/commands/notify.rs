//! `notify`: push one message through a channel sink.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use queuecast_core::{AlertDispatcher, AlertRequest, Channel, DispatchOutcome, SystemClock};

use crate::cli::{GlobalOpts, NotifyArgs};
use crate::error::CliError;
use crate::output;

/// Queue identity used for ad-hoc messages in the rate-limit ledger.
const MANUAL_QUEUE_ID: &str = "manual";

#[derive(Serialize)]
struct Sent {
    recipient: String,
    channel: Channel,
}

pub async fn handle(args: NotifyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let service = super::load_service_config(global)?;

    let channel = match args.channel.as_deref() {
        Some(raw) => raw.trim().parse::<Channel>().map_err(|_| CliError::Validation {
            field: "--channel".into(),
            reason: format!("expected 'whatsapp', 'ussd' or 'websocket', got '{raw}'"),
        })?,
        None => service.default_channel,
    };

    if args.to.trim().is_empty() {
        return Err(CliError::Validation {
            field: "--to".into(),
            reason: "recipient cannot be empty".into(),
        });
    }

    let dispatcher = AlertDispatcher::from_config(&service, Arc::new(SystemClock))?;
    let request = AlertRequest {
        recipient: args.to.trim().to_owned(),
        message: args.message,
        channel,
        queue_id: MANUAL_QUEUE_ID.into(),
        timestamp: Utc::now(),
    };

    match dispatcher.send(&request).await {
        DispatchOutcome::Delivered => {
            let sent = Sent {
                recipient: request.recipient,
                channel,
            };
            let out = output::render_single(
                &global.output,
                &sent,
                |s| format!("Sent to {} via {}", s.recipient, s.channel),
                |s| s.recipient.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        DispatchOutcome::UnknownChannel => Err(CliError::NoSink {
            channel: channel.to_string(),
        }),
        DispatchOutcome::Failed => Err(CliError::Delivery {
            message: format!("{channel} sink rejected or timed out sending to {}", request.recipient),
        }),
        DispatchOutcome::RateLimited => Err(CliError::Delivery {
            message: "rate limited".into(),
        }),
    }
}
