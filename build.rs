fn main() {
    // ESP-IDF environment propagation only matters for on-target builds;
    // host builds (tests, property checks) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
