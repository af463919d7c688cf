//! Diesel table definitions; must match `migrations/`.

diesel::table! {
    /// Cards held in the collection.
    collection_items (id) {
        /// Entity identifier (UUID v4).
        id -> Uuid,
        /// Printed card name.
        name -> Varchar,
        /// Upper-case set code.
        set_code -> Varchar,
        /// Copies held, 1 to 9999.
        quantity -> Int4,
        /// Condition spelling, e.g. `near_mint`.
        condition -> Varchar,
        /// Creation time.
        created_at -> Timestamptz,
        /// Last update time, stamped by the domain.
        updated_at -> Timestamptz,
    }
}
