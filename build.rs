fn main() -> Result<(), Box<dyn std::error::Error>> {
    tonic_build::configure().build_server(false).compile(
        &[
            "proto/common/Common.proto",
            "proto/language-agent/Tracing.proto",
            "proto/language-agent/Meter.proto",
            "proto/logging/Logging.proto",
            "proto/management/Management.proto",
            "proto/configuration/ConfigurationDiscoveryService.proto",
        ],
        &["proto"],
    )?;
    Ok(())
}
