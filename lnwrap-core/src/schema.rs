//! # Pre-built descriptor set
//!
//! Static descriptors for a slice of the LND RPC surface, standing in for
//! generated schema code (code generation itself is out of scope for this
//! crate). Everything here is built once behind `LazyLock` and shared
//! read-only for the lifetime of the process.
//!
//! [`default_registry`] returns a [`TypeRegistry`] covering every top-level
//! message type defined here.

use crate::codec::{self, DecodeError};
use crate::descriptor::{EnumDescriptor, FieldDescriptor, MessageDescriptor, TypeCategory};
use crate::message::TypedMessage;
use crate::registry::TypeRegistry;
use std::sync::LazyLock;

static INVOICE_STATE: EnumDescriptor = EnumDescriptor::new(
    "InvoiceState",
    &["OPEN", "SETTLED", "CANCELED", "ACCEPTED"],
);

static CHANNEL_POINT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "ChannelPoint",
        vec![
            FieldDescriptor::singular("funding_txid_bytes", TypeCategory::Bytes),
            FieldDescriptor::singular("funding_txid_str", TypeCategory::String).required(),
            FieldDescriptor::singular("output_index", TypeCategory::Int32),
        ],
    )
});

static OPEN_CHANNEL_REQUEST: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "OpenChannelRequest",
        vec![
            FieldDescriptor::singular("node_pubkey", TypeCategory::Bytes),
            FieldDescriptor::singular("node_pubkey_string", TypeCategory::String),
            FieldDescriptor::singular("local_funding_amount", TypeCategory::Int64),
            FieldDescriptor::singular("push_sat", TypeCategory::Int64),
            FieldDescriptor::singular("target_conf", TypeCategory::Int32),
            FieldDescriptor::singular("sat_per_byte", TypeCategory::Int64),
            FieldDescriptor::singular("private", TypeCategory::Bool),
            FieldDescriptor::singular("min_htlc_msat", TypeCategory::Int64),
            FieldDescriptor::singular("spend_unconfirmed", TypeCategory::Bool),
            FieldDescriptor::singular("close_address", TypeCategory::String),
        ],
    )
});

static CLOSE_CHANNEL_REQUEST: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "CloseChannelRequest",
        vec![
            FieldDescriptor::singular("channel_point", TypeCategory::Message(channel_point())),
            FieldDescriptor::singular("force", TypeCategory::Bool),
            FieldDescriptor::singular("target_conf", TypeCategory::Int32),
            FieldDescriptor::singular("sat_per_byte", TypeCategory::Int64),
            FieldDescriptor::singular("delivery_address", TypeCategory::String),
        ],
    )
});

static FEE_LIMIT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "FeeLimit",
        vec![
            FieldDescriptor::singular("fixed", TypeCategory::Int64),
            FieldDescriptor::singular("percent", TypeCategory::Int64),
        ],
    )
});

static DEST_CUSTOM_RECORDS_ENTRY: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "DestCustomRecordsEntry",
        vec![
            FieldDescriptor::singular("key", TypeCategory::Int64),
            FieldDescriptor::singular("value", TypeCategory::Bytes),
        ],
    )
});

static SEND_REQUEST: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "SendRequest",
        vec![
            FieldDescriptor::singular("dest", TypeCategory::Bytes),
            FieldDescriptor::singular("dest_string", TypeCategory::String),
            FieldDescriptor::singular("amt", TypeCategory::Int64),
            FieldDescriptor::singular("payment_hash", TypeCategory::Bytes),
            FieldDescriptor::singular("payment_hash_string", TypeCategory::String),
            FieldDescriptor::singular("payment_request", TypeCategory::String),
            FieldDescriptor::singular("final_cltv_delta", TypeCategory::Int32),
            FieldDescriptor::singular("fee_limit", TypeCategory::Message(fee_limit())),
            FieldDescriptor::map("dest_custom_records", dest_custom_records_entry()),
            FieldDescriptor::singular("allow_self_payment", TypeCategory::Bool),
        ],
    )
});

static HOP_HINT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "HopHint",
        vec![
            FieldDescriptor::singular("node_id", TypeCategory::String),
            FieldDescriptor::singular("chan_id", TypeCategory::Int64),
            FieldDescriptor::singular("fee_base_msat", TypeCategory::Int32),
            FieldDescriptor::singular("fee_proportional_millionths", TypeCategory::Int32),
            FieldDescriptor::singular("cltv_expiry_delta", TypeCategory::Int32),
        ],
    )
});

static ROUTE_HINT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "RouteHint",
        vec![FieldDescriptor::repeated(
            "hop_hints",
            TypeCategory::Message(hop_hint()),
        )],
    )
});

static INVOICE: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "Invoice",
        vec![
            FieldDescriptor::singular("memo", TypeCategory::String),
            FieldDescriptor::singular("r_preimage", TypeCategory::Bytes),
            FieldDescriptor::singular("r_hash", TypeCategory::Bytes),
            FieldDescriptor::singular("value", TypeCategory::Int64),
            FieldDescriptor::singular("settled", TypeCategory::Bool),
            FieldDescriptor::singular("creation_date", TypeCategory::Int64),
            FieldDescriptor::singular("settle_date", TypeCategory::Int64),
            FieldDescriptor::singular("payment_request", TypeCategory::String),
            FieldDescriptor::singular("expiry", TypeCategory::Int64),
            FieldDescriptor::singular("private", TypeCategory::Bool),
            FieldDescriptor::singular("add_index", TypeCategory::Int64),
            FieldDescriptor::singular("state", TypeCategory::Enum(&INVOICE_STATE)),
            FieldDescriptor::repeated("route_hints", TypeCategory::Message(route_hint())),
        ],
    )
});

static CHANNEL_FEE_REPORT: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "ChannelFeeReport",
        vec![
            FieldDescriptor::singular("chan_id", TypeCategory::Int64),
            FieldDescriptor::singular("channel_point", TypeCategory::String),
            FieldDescriptor::singular("base_fee_msat", TypeCategory::Int64),
            FieldDescriptor::singular("fee_per_mil", TypeCategory::Int64),
            FieldDescriptor::singular("fee_rate", TypeCategory::Double),
        ],
    )
});

static MACAROON_PERMISSION: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "MacaroonPermission",
        vec![
            FieldDescriptor::singular("entity", TypeCategory::String).required(),
            FieldDescriptor::singular("action", TypeCategory::String).required(),
        ],
    )
});

static BAKE_MACAROON_REQUEST: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "BakeMacaroonRequest",
        vec![
            FieldDescriptor::repeated("permissions", TypeCategory::Message(macaroon_permission()))
                .required(),
            FieldDescriptor::singular("root_key_id", TypeCategory::Int64),
        ],
    )
});

static CHANNEL_BACKUP: LazyLock<MessageDescriptor> = LazyLock::new(|| {
    MessageDescriptor::new(
        "ChannelBackup",
        vec![
            FieldDescriptor::singular("chan_point", TypeCategory::Message(channel_point()))
                .required(),
            FieldDescriptor::singular("chan_backup", TypeCategory::Bytes),
        ],
    )
});

pub fn invoice_state() -> &'static EnumDescriptor {
    &INVOICE_STATE
}

pub fn channel_point() -> &'static MessageDescriptor {
    &CHANNEL_POINT
}

pub fn open_channel_request() -> &'static MessageDescriptor {
    &OPEN_CHANNEL_REQUEST
}

pub fn close_channel_request() -> &'static MessageDescriptor {
    &CLOSE_CHANNEL_REQUEST
}

pub fn fee_limit() -> &'static MessageDescriptor {
    &FEE_LIMIT
}

pub fn dest_custom_records_entry() -> &'static MessageDescriptor {
    &DEST_CUSTOM_RECORDS_ENTRY
}

pub fn send_request() -> &'static MessageDescriptor {
    &SEND_REQUEST
}

pub fn hop_hint() -> &'static MessageDescriptor {
    &HOP_HINT
}

pub fn route_hint() -> &'static MessageDescriptor {
    &ROUTE_HINT
}

pub fn invoice() -> &'static MessageDescriptor {
    &INVOICE
}

pub fn channel_fee_report() -> &'static MessageDescriptor {
    &CHANNEL_FEE_REPORT
}

pub fn macaroon_permission() -> &'static MessageDescriptor {
    &MACAROON_PERMISSION
}

pub fn bake_macaroon_request() -> &'static MessageDescriptor {
    &BAKE_MACAROON_REQUEST
}

pub fn channel_backup() -> &'static MessageDescriptor {
    &CHANNEL_BACKUP
}

fn new_channel_point(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, channel_point())
}

fn new_open_channel_request(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, open_channel_request())
}

fn new_close_channel_request(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, close_channel_request())
}

fn new_send_request(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, send_request())
}

fn new_invoice(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, invoice())
}

fn new_channel_fee_report(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, channel_fee_report())
}

fn new_macaroon_permission(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, macaroon_permission())
}

fn new_bake_macaroon_request(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, bake_macaroon_request())
}

fn new_channel_backup(body: &serde_json::Value) -> Result<TypedMessage, DecodeError> {
    codec::decode(body, channel_backup())
}

/// Builds a registry covering every top-level message type in this schema.
pub fn default_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register(channel_point(), new_channel_point);
    registry.register(open_channel_request(), new_open_channel_request);
    registry.register(close_channel_request(), new_close_channel_request);
    registry.register(send_request(), new_send_request);
    registry.register(invoice(), new_invoice);
    registry.register(channel_fee_report(), new_channel_fee_report);
    registry.register(macaroon_permission(), new_macaroon_permission);
    registry.register(bake_macaroon_request(), new_bake_macaroon_request);
    registry.register(channel_backup(), new_channel_backup);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_order_is_preserved() {
        let names: Vec<_> = open_channel_request()
            .fields()
            .iter()
            .map(|f| f.name())
            .collect();
        let push_sat = names.iter().position(|n| *n == "push_sat").unwrap();
        let target_conf = names.iter().position(|n| *n == "target_conf").unwrap();
        assert!(push_sat < target_conf);
    }

    #[test]
    fn default_registry_covers_top_level_types() {
        let registry = default_registry();
        for name in [
            "ChannelPoint",
            "OpenChannelRequest",
            "SendRequest",
            "Invoice",
            "ChannelFeeReport",
            "BakeMacaroonRequest",
        ] {
            assert!(registry.resolve(name).is_some(), "missing {name}");
        }
    }
}
