//! Physical-interaction helpers: encoder, thermistors, network

/// Rotary encoder input via QMP key events.
///
/// The simulator maps the encoder button to the enter key.
pub mod encoder {
    use crate::error::Result;
    use crate::printer::PrinterHandle;

    /// Press the encoder button
    pub async fn click(printer: &PrinterHandle) -> Result<()> {
        printer.qmp().send_key(&["ret"]).await
    }
}

/// Thermistor overrides via QOM properties
pub mod temperature {
    use serde_json::json;

    use crate::error::Result;
    use crate::printer::PrinterHandle;

    /// Thermistor selector
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Thermistor {
        Bed,
        Nozzle,
    }

    impl Thermistor {
        fn qom_path<'a>(&self, printer: &'a PrinterHandle) -> &'a str {
            match self {
                Thermistor::Bed => &printer.config().bed_qom_path,
                Thermistor::Nozzle => &printer.config().nozzle_qom_path,
            }
        }
    }

    /// Force a thermistor to read the given temperature in celsius
    pub async fn set(printer: &PrinterHandle, which: Thermistor, celsius: f64) -> Result<()> {
        printer
            .qmp()
            .qom_set(which.qom_path(printer), "temperature", json!(celsius))
            .await
    }
}

/// Network plumbing between the host and the guest WUI
pub mod network {
    use crate::printer::PrinterHandle;

    /// Host port the guest web interface is forwarded to
    pub fn proxy_http_port(printer: &PrinterHandle) -> u16 {
        printer.http_port()
    }

    /// Base URL of the proxied web interface
    pub fn wui_base_url(printer: &PrinterHandle) -> String {
        format!("http://127.0.0.1:{}", proxy_http_port(printer))
    }
}
