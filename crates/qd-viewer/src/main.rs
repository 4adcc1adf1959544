mod bars;

use qd_engine::device::GpuInit;
use qd_engine::logging::{init_logging, LoggingConfig};
use qd_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "qd viewer".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
    };
    Runtime::run(config, GpuInit::default(), bars::BarsApp::new())
}
