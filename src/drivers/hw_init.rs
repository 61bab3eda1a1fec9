//! One-shot hardware peripheral initialization.
//!
//! Configures the single-wire bus pins as open-drain I/O and the flow
//! turbine inputs as rising-edge interrupt sources, using raw ESP-IDF sys
//! calls. Called once from `main()` before the sample loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the sample loop; single-threaded.
    unsafe {
        init_onewire_pins()?;
        init_flow_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── Single-wire buses (open drain) ───────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_onewire_pins() -> Result<(), HwInitError> {
    for &pin in &pins::ONEWIRE_BUS_GPIOS {
        // External 4.7k pull-ups are fitted; the internal one only helps
        // while a probe is unplugged.
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        // Released (idle high).
        unsafe { gpio_set_level(pin, 1) };
    }

    info!(
        "hw_init: {} single-wire buses configured",
        pins::ONEWIRE_BUS_GPIOS.len()
    );
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to a pin configured in
    // init_onewire_pins(). Main-loop only.
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── Flow turbine inputs ───────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_flow_inputs() -> Result<(), HwInitError> {
    for &pin in &pins::FLOW_PULSE_GPIOS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: flow inputs configured");
    Ok(())
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// `arg` carries the flow channel index, not a pointer.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(arg: *mut core::ffi::c_void) {
    crate::sensors::flow::FLOW_COUNTERS.record_pulse(arg as usize);
}

/// Install the per-pin GPIO ISR service and register one flow handler per
/// turbine. Call after init_peripherals() and before the sample loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable). The handler only does a
    // relaxed atomic increment.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for (channel, &pin) in pins::FLOW_PULSE_GPIOS.iter().enumerate() {
            gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_POSEDGE);
            let ret = gpio_isr_handler_add(
                pin,
                Some(flow_gpio_isr),
                channel as *mut core::ffi::c_void,
            );
            if ret != ESP_OK {
                return Err(HwInitError::IsrAddFailed(ret));
            }
            gpio_intr_enable(pin);
        }

        info!(
            "hw_init: ISR service installed ({} flow channels)",
            pins::FLOW_PULSE_GPIOS.len()
        );
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
