fn main() {
    // Vendored `protoc` fallback so the build doesn't depend on a system
    // package being installed, matching the orchestrator crate's approach.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(pb) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", pb);
        }
    }

    let proto = "proto/jitwatcher/v1/access.proto";
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile(&[proto], &["proto"])
        .expect("proto build failed");
    println!("cargo:rerun-if-changed={proto}");
}
