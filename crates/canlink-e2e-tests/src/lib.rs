//! End-to-end tests for `canlink-isotp` over a real `vcan` interface.
//!
//! Everything lives under `tests/`. Tests skip themselves when `vcan0` is
//! missing or the kernel has no ISO-TP support:
//!
//! ```sh
//! sudo modprobe vcan can-isotp
//! sudo ip link add dev vcan0 type vcan && sudo ip link set up vcan0
//! ```
