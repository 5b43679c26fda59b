table! {
    settings (name) {
        name -> Text,
        value -> Text,
    }
}
