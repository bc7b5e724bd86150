fn main() {
    // Feature flags reach build scripts as environment variables, not cfgs.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
