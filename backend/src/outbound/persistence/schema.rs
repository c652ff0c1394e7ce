//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match the deployed schema exactly; migrations are managed outside
//! this crate. `diesel print-schema` regenerates them from a live database.

diesel::table! {
    /// Registered user accounts.
    users (id) {
        /// Store-assigned identifier (BIGSERIAL).
        id -> Int8,
        name -> Text,
        /// Unique across all rows.
        email -> Text,
        hashed_password -> Text,
        /// 0 unspecified, 1 user, 2 admin.
        role -> Int2,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail of orchestrated operations.
    audit_logs (id) {
        id -> Int8,
        /// Operation name: Create, Get, Update or Delete.
        action_type -> Text,
        request_data -> Jsonb,
        response_data -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(users, audit_logs);
