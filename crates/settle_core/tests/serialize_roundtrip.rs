use serde_json::{json, Value as JsonValue};
use settle_core::{
    DeserializeError, SerializeError, SettingValue, SettingsDeserializer, SettingsSerializer,
    StorageEncoding, WrapError, Wrappable, WrapperRegistry,
};
use std::any::Any;
use std::sync::Arc;

/// Handle to an entity living in an unrelated store; persists as its id.
#[derive(Debug)]
struct EntityHandle {
    id: i64,
    /// Set only on instances rebuilt from a surrogate.
    restored: bool,
}

const ENTITY_HANDLE_TYPE: &str = "demo.entity_handle";

impl EntityHandle {
    fn new(id: i64) -> Self {
        Self {
            id,
            restored: false,
        }
    }
}

impl Wrappable for EntityHandle {
    fn type_reference(&self) -> &'static str {
        ENTITY_HANDLE_TYPE
    }

    fn wrap(&self) -> Result<JsonValue, WrapError> {
        Ok(json!({ "id": self.id }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn unwrap_entity_handle(
    _type_reference: &str,
    payload: JsonValue,
) -> Result<Arc<dyn Wrappable>, WrapError> {
    let id = payload
        .get("id")
        .and_then(JsonValue::as_i64)
        .ok_or_else(|| WrapError::InvalidPayload("missing numeric `id`".to_string()))?;
    Ok(Arc::new(EntityHandle { id, restored: true }))
}

/// Wrappable that always fails to produce a surrogate.
#[derive(Debug)]
struct BrokenHandle;

impl Wrappable for BrokenHandle {
    fn type_reference(&self) -> &'static str {
        "demo.broken"
    }

    fn wrap(&self) -> Result<JsonValue, WrapError> {
        Err(WrapError::NotWrappable("no identifier yet".to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn entity_registry() -> WrapperRegistry {
    let mut registry = WrapperRegistry::new();
    registry
        .register(ENTITY_HANDLE_TYPE, unwrap_entity_handle)
        .expect("registration should succeed");
    registry
}

fn strict_pipeline(encoding: StorageEncoding) -> (SettingsSerializer, SettingsDeserializer) {
    (
        SettingsSerializer::new(encoding, true),
        SettingsDeserializer::new(entity_registry(), encoding, true),
    )
}

#[test]
fn null_passes_through_both_directions() {
    let (serializer, deserializer) = strict_pipeline(StorageEncoding::Plain);
    assert_eq!(serializer.serialize(None).unwrap(), None);
    assert_eq!(deserializer.deserialize(None).unwrap(), None);
}

#[test]
fn structured_values_round_trip() {
    let (serializer, deserializer) = strict_pipeline(StorageEncoding::Plain);
    let original = SettingValue::from(json!({
        "title": "Settle",
        "limits": { "page": 25, "burst": [1, 2, 3] },
        "enabled": true
    }));

    let stored = serializer.serialize(Some(&original)).unwrap().unwrap();
    let restored = deserializer.deserialize(Some(&stored)).unwrap().unwrap();
    assert_eq!(restored, original);
}

#[test]
fn decoded_json_null_normalizes_to_none() {
    let (_, deserializer) = strict_pipeline(StorageEncoding::Plain);
    assert_eq!(deserializer.deserialize(Some("null")).unwrap(), None);
}

#[test]
fn base64_escaping_round_trips() {
    let (serializer, deserializer) = strict_pipeline(StorageEncoding::Base64);
    let original = SettingValue::from(json!(["text with \" quotes", 42]));

    let stored = serializer.serialize(Some(&original)).unwrap().unwrap();
    // The escaped form must not be raw JSON.
    assert!(!stored.starts_with('['));

    let restored = deserializer.deserialize(Some(&stored)).unwrap().unwrap();
    assert_eq!(restored, original);
}

#[test]
fn corrupt_input_degrades_or_raises_by_mode() {
    let lax = SettingsDeserializer::new(entity_registry(), StorageEncoding::Plain, false);
    assert_eq!(lax.deserialize(Some("{broken")).unwrap(), None);

    let strict = SettingsDeserializer::new(entity_registry(), StorageEncoding::Plain, true);
    let err = strict.deserialize(Some("{broken")).unwrap_err();
    assert!(matches!(err, DeserializeError::Decode(_)));
}

#[test]
fn wrapped_value_persists_only_its_envelope() {
    let (serializer, _) = strict_pipeline(StorageEncoding::Plain);
    let handle = SettingValue::wrapped(Arc::new(EntityHandle::new(7)));

    let stored = serializer.serialize(Some(&handle)).unwrap().unwrap();
    let decoded: JsonValue = serde_json::from_str(&stored).unwrap();
    assert_eq!(decoded, json!({ "c": ENTITY_HANDLE_TYPE, "d": { "id": 7 } }));
}

#[test]
fn wrapped_value_round_trips_to_a_rebuilt_instance() {
    let (serializer, deserializer) = strict_pipeline(StorageEncoding::Plain);
    let original = SettingValue::wrapped(Arc::new(EntityHandle::new(7)));

    let stored = serializer.serialize(Some(&original)).unwrap().unwrap();
    let restored = deserializer.deserialize(Some(&stored)).unwrap().unwrap();

    // Equal by surrogate payload...
    assert_eq!(restored, original);

    // ...but a reconstruction, not the original object.
    let handle = restored
        .as_wrapped()
        .expect("wrapped value expected")
        .as_any()
        .downcast_ref::<EntityHandle>()
        .expect("EntityHandle expected");
    assert_eq!(handle.id, 7);
    assert!(handle.restored);
}

#[test]
fn unknown_type_reference_raises_or_degrades_by_mode() {
    let stored = json!({ "c": "demo.retired_type", "d": 1 }).to_string();

    let strict = SettingsDeserializer::new(entity_registry(), StorageEncoding::Plain, true);
    let err = strict.deserialize(Some(&stored)).unwrap_err();
    assert!(matches!(err, DeserializeError::UnknownTypeReference(_)));

    let lax = SettingsDeserializer::new(entity_registry(), StorageEncoding::Plain, false);
    assert_eq!(lax.deserialize(Some(&stored)).unwrap(), None);
}

#[test]
fn invalid_surrogate_payload_surfaces_as_unwrap_error() {
    let stored = json!({ "c": ENTITY_HANDLE_TYPE, "d": { "name": "no id" } }).to_string();

    let strict = SettingsDeserializer::new(entity_registry(), StorageEncoding::Plain, true);
    let err = strict.deserialize(Some(&stored)).unwrap_err();
    assert!(matches!(err, DeserializeError::Unwrap(_)));
}

#[test]
fn wrap_failure_raises_or_drops_by_mode() {
    let broken = SettingValue::wrapped(Arc::new(BrokenHandle));

    let strict = SettingsSerializer::new(StorageEncoding::Plain, true);
    let err = strict.serialize(Some(&broken)).unwrap_err();
    assert!(matches!(err, SerializeError::Wrap(_)));

    let lax = SettingsSerializer::new(StorageEncoding::Plain, false);
    assert_eq!(lax.serialize(Some(&broken)).unwrap(), None);
}

#[test]
fn two_field_object_without_envelope_shape_stays_a_plain_value() {
    let (_, deserializer) = strict_pipeline(StorageEncoding::Plain);
    let stored = json!({ "c": 3, "d": 4 }).to_string();

    let restored = deserializer.deserialize(Some(&stored)).unwrap().unwrap();
    assert_eq!(restored, SettingValue::from(json!({ "c": 3, "d": 4 })));
}
