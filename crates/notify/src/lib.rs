//! Alert delivery for the uptime worker.
//!
//! - [`MessageGateway`]: fire-and-forget `send(destination, message)` port.
//! - [`TwilioSmsGateway`]: SMS delivery through the Twilio REST API.
//! - [`LogOnlyGateway`]: fallback that only logs, used when no SMS
//!   credentials are configured.
//! - [`AlertDispatcher`]: formats a state-change alert and hands it to a
//!   gateway, best-effort and without retry.

pub mod dispatcher;
pub mod gateway;
pub mod sms;

pub use dispatcher::AlertDispatcher;
pub use gateway::{GatewayError, LogOnlyGateway, MessageGateway};
pub use sms::{SmsConfig, TwilioSmsGateway};
