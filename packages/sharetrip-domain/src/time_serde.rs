//! RFC 3339 `serde(with = ...)` adapters for `OffsetDateTime` fields.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	format::<S>(value)?.serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	parse::<D>(&String::deserialize(deserializer)?)
}

pub mod option {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use time::OffsetDateTime;

	pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.as_ref().map(super::format::<S>).transpose()?.serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?.as_deref().map(super::parse::<D>).transpose()
	}
}

pub mod vec {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use time::OffsetDateTime;

	pub fn serialize<S>(values: &[OffsetDateTime], serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		values.iter().map(super::format::<S>).collect::<Result<Vec<_>, _>>()?.serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<OffsetDateTime>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Vec::<String>::deserialize(deserializer)?.iter().map(|raw| super::parse::<D>(raw)).collect()
	}
}

fn format<S>(value: &OffsetDateTime) -> Result<String, S::Error>
where
	S: Serializer,
{
	value.format(&Rfc3339).map_err(serde::ser::Error::custom)
}

fn parse<'de, D>(raw: &str) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	OffsetDateTime::parse(raw, &Rfc3339).map_err(serde::de::Error::custom)
}
