//! Diesel schema definitions for Qlarity server.

diesel::table! {
    coverage_reports (id) {
        id -> Text,
        repository -> Text,
        filename -> Text,
        data -> Jsonb,
        uploaded_at -> Timestamp,
    }
}
