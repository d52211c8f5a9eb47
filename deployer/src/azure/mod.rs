//! Azure IoT Hub provisioning through the `az` CLI

pub mod cli;
