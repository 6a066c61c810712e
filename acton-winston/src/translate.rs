//! Event translation
//!
//! Maps one event payload, and optionally the request it belongs to, onto
//! at most one call into the context's logger.
//!
//! Shaping rules, first match wins:
//!
//! 1. no payload: nothing is logged
//! 2. error payload: the error is logged as-is, nothing else is attached
//! 3. string data becomes the message
//! 4. other data is attached as `baseInfo` when data inclusion is on
//!    (or merged into the top level with `merge_data`)
//! 5. otherwise, with `skip_undefined`, the event is dropped
//!
//! Tags and the request summary are attached to every logged record.
//! Merged data never overrides them.

use http::HeaderMap;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::context::Context;
use crate::error::TranslateError;
use crate::event::{Payload, RequestInfo};
use crate::logger::{LogEntry, Metadata, RequestSummary, TagField};

/// Shape an event into the entry that would be logged, if any
pub fn shape(
    ctx: &Context,
    payload: Option<&Payload>,
    request: Option<&RequestInfo>,
) -> Result<Option<LogEntry>, TranslateError> {
    let Some(payload) = payload else {
        return Ok(None);
    };

    let event = match payload {
        Payload::Error(err) => return Ok(Some(LogEntry::Error(err.clone()))),
        Payload::Event(event) => event,
    };

    let mut meta = Metadata::default();

    if ctx.include_tags {
        if let Some(tags) = &event.tags {
            meta.tags = Some(match ctx.join_tags.as_deref() {
                Some(sep) if !sep.is_empty() => TagField::Joined(tags.join(sep)),
                _ => TagField::List(tags.clone()),
            });
        }
    }

    if let Some(request) = request {
        meta.request_info = Some(summarize(request)?);
    }

    let mut message = String::new();
    match &event.data {
        Some(Value::String(text)) => message.clone_from(text),
        Some(data) if ctx.include_data => match data {
            Value::Object(fields) if ctx.merge_data => {
                meta.merged = fields
                    .iter()
                    .filter(|(key, _)| !Metadata::RESERVED_FIELDS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
            }
            other => meta.base_info = Some(other.clone()),
        },
        _ if ctx.skip_undefined => return Ok(None),
        _ => {}
    }

    Ok(Some(LogEntry::record(message, meta)))
}

/// Translate an event and forward it to the context's logger
///
/// Performs at most one logger call. Errors, including a panicking
/// logger, are returned to the caller rather than logged here.
pub fn translate(
    ctx: &Context,
    payload: Option<&Payload>,
    request: Option<&RequestInfo>,
) -> Result<(), TranslateError> {
    let Some(entry) = shape(ctx, payload, request)? else {
        return Ok(());
    };

    panic::catch_unwind(AssertUnwindSafe(|| ctx.logger.log(ctx.level, entry))).map_err(|panic| {
        TranslateError::LoggerPanicked {
            message: panic_message(panic.as_ref()),
        }
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn summarize(request: &RequestInfo) -> Result<RequestSummary, TranslateError> {
    Ok(RequestSummary {
        method: request.method.to_string(),
        headers: headers_to_json(&request.headers)?,
        url: request.path.clone(),
    })
}

/// Serialize headers as a JSON object; repeated headers become arrays
///
/// Values are decoded lossily so non-ASCII bytes never cost a log line.
fn headers_to_json(headers: &HeaderMap) -> Result<String, TranslateError> {
    let mut object = Map::new();

    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|value| Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();

        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(name.as_str().to_string(), value);
    }

    Ok(serde_json::to_string(&object)?)
}
