//! Diesel table definitions for the linkup schema.
//!
//! These must match `backend/migrations`. PostGIS `geography` columns have no
//! Diesel type and are left out; queries touching them go through
//! `sql_query` in the repository.

diesel::table! {
    /// Last known location fix per user. `last_location` is omitted.
    user_locations (user_id) {
        user_id -> Uuid,
        display_name -> Nullable<Text>,
        active -> Bool,
        last_active -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Linkup records. `origin` is omitted.
    linkups (id) {
        id -> Uuid,
        initiator -> Uuid,
        second_participant -> Nullable<Uuid>,
        search_radius_m -> Float8,
        vibe -> Text,
        message -> Text,
        place_ref -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per invited candidate; `(linkup_id, user_id)` is unique.
    linkup_invitations (linkup_id, user_id) {
        linkup_id -> Uuid,
        user_id -> Uuid,
        attendance_status -> Text,
    }
}

diesel::joinable!(linkup_invitations -> linkups (linkup_id));
diesel::allow_tables_to_appear_in_same_query!(user_locations, linkups, linkup_invitations);
