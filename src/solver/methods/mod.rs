//! Concrete integrators
//!
//! Implementations of the [`Integrator`](crate::solver::Integrator) trait:
//!
//! - **[`PacketIntegrator`]**: finite-rate kinetics, packet subdivision,
//!   self-consistent iR correction and active-window truncation. This is the
//!   production method.
//! - **[`NernstianIntegrator`]**: infinitely fast kinetics, closed form. Used
//!   as a reference for the fast-kinetics limit.
//!
//! Both read the same [`KineticsConfiguration`](crate::solver::KineticsConfiguration)
//! so they can be swapped behind a `&dyn Integrator`.

mod nernstian;
mod packet;

pub use nernstian::NernstianIntegrator;
pub use packet::{packet_count, PacketIntegrator};
