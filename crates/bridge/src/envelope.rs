use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire shape of every round trip reply: exactly one of `{"data": ...}` or `{"error": "..."}`.
///
/// Keeping failures in their own field is what tells a failed call apart from one that
/// successfully returned `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Envelope {
	Data(Value),
	Error(String),
}

impl Envelope {
	pub fn error(message: impl Into<String>) -> Self {
		Self::Error(message.into())
	}

	#[must_use]
	pub fn into_value(self) -> Value {
		let (field, value) = match self {
			Self::Data(data) => ("data", data),
			Self::Error(message) => ("error", Value::String(message)),
		};

		let mut object = Map::with_capacity(1);
		object.insert(field.to_string(), value);

		Value::Object(object)
	}

	pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
		serde_json::from_value(value)
	}

	#[must_use]
	pub fn into_result(self) -> Result<Value, String> {
		match self {
			Self::Data(data) => Ok(data),
			Self::Error(message) => Err(message),
		}
	}
}

impl<E: std::fmt::Display> From<Result<Value, E>> for Envelope {
	fn from(result: Result<Value, E>) -> Self {
		match result {
			Ok(data) => Self::Data(data),
			Err(e) => Self::Error(e.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn null_data_is_not_an_error() {
		let reply = Envelope::Data(Value::Null).into_value();

		assert_eq!(reply, json!({ "data": null }));
		assert_eq!(
			Envelope::from_value(reply).ok().map(Envelope::into_result),
			Some(Ok(Value::Null))
		);
	}

	#[test]
	fn errors_travel_as_plain_strings() {
		let reply = Envelope::from(Err::<Value, _>("boom")).into_value();

		assert_eq!(reply, json!({ "error": "boom" }));
		assert_eq!(
			Envelope::from_value(reply).ok(),
			Some(Envelope::error("boom"))
		);
	}

	#[test]
	fn other_shapes_are_rejected() {
		for reply in [
			json!(null),
			json!(42),
			json!({}),
			json!({ "result": 1 }),
			json!({ "data": 1, "error": "x" }),
			json!({ "error": { "message": "structured" } }),
		] {
			assert!(Envelope::from_value(reply.clone()).is_err(), "{reply} accepted");
		}
	}
}
