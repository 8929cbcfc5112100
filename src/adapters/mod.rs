// Adapters layer: concrete implementations of the domain ports for external systems.
// Storage backends live next to their configuration under `config`.

pub mod http;
