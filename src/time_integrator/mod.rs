pub mod fvm_ssp_rk;
pub mod time_discretization;
pub mod time_step;
