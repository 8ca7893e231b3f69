// Mirrors the table owned by the application that prepares batch downloads.

diesel::table! {
    batch_downloads (key) {
        key -> Text,
        files_hash -> Nullable<Text>,
    }
}
