use bson::Bson;
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::command::{db_command_factory, Command, CommandError, CommandResult, ScribePayload};
use crate::db::ScribeCommandExecutor;
use crate::error::Result;
use crate::metrics;

/// Envelope of one stream record. `payload` is either the JSON-encoded
/// command payload or the payload object itself.
#[derive(Debug, Deserialize)]
struct StreamRecord {
    payload: Bson,
}

/// Outcome of one processed batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub valid: usize,
    pub invalid: usize,
}

/// Decode one raw stream record into a command. Bytes that are not UTF-8
/// JSON are an unreadable record like any other.
pub fn decode_message(raw: impl AsRef<[u8]>) -> CommandResult<Command> {
    let record: StreamRecord = serde_json::from_slice(raw.as_ref())
        .map_err(|e| CommandError::UnknownCommandType(format!("unreadable stream record: {}", e)))?;
    match record.payload {
        Bson::String(payload) => db_command_factory(&payload),
        Bson::Document(payload) => {
            let payload: ScribePayload = bson::from_document(payload)
                .map_err(|e| CommandError::UnknownCommandType(format!("unreadable payload: {}", e)))?;
            Command::from_payload(payload)
        }
        other => Err(CommandError::UnknownCommandType(format!("unexpected payload {}", other))),
    }
}

/// Turns batches of stream records into database writes.
#[derive(Clone)]
pub struct ScribeStep {
    executor: ScribeCommandExecutor,
}

impl ScribeStep {
    pub fn new(executor: ScribeCommandExecutor) -> Self {
        Self { executor }
    }

    /// Decode every record, keeping input order. Invalid records are logged
    /// and counted, never fatal.
    pub fn decode_batch<S: AsRef<[u8]>>(messages: &[S]) -> (Vec<Command>, usize) {
        let mut valid_commands = Vec::with_capacity(messages.len());
        let mut n_invalid = 0usize;
        for (position, message) in messages.iter().enumerate() {
            match decode_message(message.as_ref()) {
                Ok(command) => valid_commands.push(command),
                Err(e) => {
                    tracing::error!(position = position, error = %e, "Error processing message");
                    n_invalid += 1;
                }
            }
        }
        (valid_commands, n_invalid)
    }

    /// Process one batch. Only a sink failure is returned as an error.
    pub async fn execute<S: AsRef<[u8]>>(&self, messages: &[S]) -> Result<BatchReport> {
        let span = tracing::info_span!("batch", batch_id = %Uuid::new_v4(), size = messages.len());
        async move {
            tracing::info!("Processing messages...");
            let (valid_commands, n_invalid) = Self::decode_batch(messages);
            let report = BatchReport { valid: valid_commands.len(), invalid: n_invalid };
            metrics::record_batch(report.valid as u64, report.invalid as u64);
            tracing::info!(
                valid = report.valid,
                invalid = report.invalid,
                "Processed {} messages successfully. Found {} invalid messages.",
                report.valid,
                report.invalid
            );

            if !valid_commands.is_empty() {
                tracing::info!("Writing commands into database");
                self.executor.bulk_execute(&valid_commands).await?;
            }
            Ok(report)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_string_payload() {
        let raw = r#"{"payload": "{\"collection\":\"object\",\"type\":\"insert\",\"data\":{\"_id\":\"a\"}}"}"#;
        let command = decode_message(raw).unwrap();
        assert_eq!(command.collection(), "object");
        assert_eq!(command.type_name(), "insert");
    }

    #[test]
    fn test_decode_object_payload() {
        let raw = r#"{"payload": {"collection":"detection","type":"update","criteria":{"_id":"a"},"data":{"f":2}}}"#;
        let command = decode_message(raw).unwrap();
        assert_eq!(command.collection(), "detection");
        assert_eq!(command.type_name(), "update");
    }

    #[test]
    fn test_decode_bad_records() {
        for raw in ["garbage", r#"{"no_payload": 1}"#, r#"{"payload": 42}"#, r#"{"payload": "{oops"}"#] {
            assert!(matches!(decode_message(raw), Err(CommandError::UnknownCommandType(_))), "{}", raw);
        }
    }

    #[test]
    fn test_decode_invalid_utf8_is_unreadable() {
        let raw: &[u8] = b"{\"payload\": \"\xff\xfe\"}";
        assert!(matches!(decode_message(raw), Err(CommandError::UnknownCommandType(_))));
    }

    #[test]
    fn test_decode_batch_counts_undecodable_bytes() {
        let messages: Vec<Vec<u8>> = vec![
            br#"{"payload": {"collection":"a","type":"insert","data":{"_id":1}}}"#.to_vec(),
            vec![0xff, 0xfe, b'\n'],
            br#"{"payload": {"collection":"b","type":"insert","data":{"_id":2}}}"#.to_vec(),
        ];
        let (commands, invalid) = ScribeStep::decode_batch(&messages);
        assert_eq!(invalid, 1);
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_decode_batch_counts_invalid_and_keeps_order() {
        let messages = vec![
            r#"{"payload": {"collection":"a","type":"insert","data":{"_id":1}}}"#,
            r#"{"payload": {"collection":"b","type":"bogus","data":{"_id":2}}}"#,
            r#"{"payload": {"type":"insert","data":{"_id":3}}}"#,
            r#"{"payload": {"collection":"c","type":"insert","data":{"_id":4}}}"#,
        ];
        let (commands, invalid) = ScribeStep::decode_batch(&messages);
        assert_eq!(invalid, 2);
        let collections: Vec<&str> = commands.iter().map(Command::collection).collect();
        assert_eq!(collections, vec!["a", "c"]);
    }
}
