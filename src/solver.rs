use std::path::Path;
use std::rc::Rc;

use csv::Writer;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::convergence::{total_residual, Convergence};
use crate::error::Result;
use crate::fv_core::mesh::Mesh;
use crate::physics::GoverningEquations;
use crate::time_integrator::fvm_ssp_rk::TimeIntegrator;
use crate::time_integrator::time_discretization::TwoPointTimeDiscretization;

//STRUCTS
/// Drives a time integrator until convergence, steady or in dual time.
pub struct Solver {
    eqn: Rc<dyn GoverningEquations>,
    convergence: Convergence,
    config: SolverConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SteadyReport {
    pub iterations: usize,
    pub converged: bool,
    /// Total residual after every iteration.
    pub history: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransientReport {
    /// Pseudo iterations spent on each real time step.
    pub iterations: Vec<usize>,
    pub final_time: f64,
}

#[derive(Serialize)]
struct StepRow {
    step: usize,
    time: f64,
    iterations: usize,
    converged: bool,
}

//HELPER FUNCTIONS
fn progress_bar(len: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} (eta: {eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("█░"));
    }
    pb
}

/// Writes `iteration, <var names>` rows.
pub fn write_residual_history<P: AsRef<Path>>(
    path: P,
    var_names: &[&str],
    history: &[Vec<f64>],
) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    let mut header = vec!["iteration".to_string()];
    header.extend(var_names.iter().map(|n| n.to_string()));
    wtr.write_record(&header)?;
    for (i, row) in history.iter().enumerate() {
        let mut record = vec![(i + 1).to_string()];
        record.extend(row.iter().map(|r| r.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one `cell, x, y, z, <var names>` row per cell.
pub fn write_solution<P: AsRef<Path>>(path: P, var_names: &[&str], mesh: &Mesh) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    let mut header: Vec<String> = ["cell", "x", "y", "z"].iter().map(|s| s.to_string()).collect();
    header.extend(var_names.iter().map(|n| n.to_string()));
    wtr.write_record(&header)?;
    for cell in mesh.grid.cells() {
        let c = cell.centroid();
        let mut record = vec![
            cell.index.to_string(),
            c.x.to_string(),
            c.y.to_string(),
            c.z.to_string(),
        ];
        record.extend(mesh.fields.u(cell.index).iter().map(|u| u.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

//IMPLEMENTATION
impl Solver {
    pub fn new(
        eqn: Rc<dyn GoverningEquations>,
        convergence: Convergence,
        config: SolverConfig,
    ) -> Self {
        Solver {
            eqn,
            convergence,
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Iterates in pseudo time until every variable's total residual is
    /// below tolerance or the iteration budget runs out.
    pub fn solve_steady(
        &self,
        mesh: &mut Mesh,
        integrator: &mut dyn TimeIntegrator,
    ) -> Result<SteadyReport> {
        integrator.set_courant_number(self.config.courant_number);
        info!(
            "{}: steady solve on {} cells",
            self.eqn.description(),
            mesh.num_cells()
        );

        let pb = progress_bar(self.config.max_iterations as u64, self.config.show_progress);
        let mut history = Vec::new();
        let mut converged = false;
        for iter in 0..self.config.max_iterations {
            integrator.update_cell_averages(mesh, 0.0)?;
            let residual = total_residual(mesh, self.config.convergence_norm);
            debug!("iteration {}: {:?}", iter + 1, residual);
            converged = self.convergence.has_converged(&residual)?;
            history.push(residual);
            pb.set_position(iter as u64 + 1);
            if converged {
                break;
            }
        }
        pb.finish_with_message("done");

        let iterations = history.len();
        if converged {
            info!("converged after {} iterations", iterations);
        } else {
            warn!(
                "not converged after {} iterations, residual {:?}",
                iterations,
                history.last()
            );
        }

        if let Some(dir) = self.config.prepare_working_directory()? {
            let names = self.eqn.var_names();
            write_residual_history(dir.join("residuals.csv"), &names, &history)?;
            write_solution(dir.join("solution.csv"), &names, mesh)?;
        }

        Ok(SteadyReport {
            iterations,
            converged,
            history,
        })
    }

    /// Dual time stepping over `num_steps` real steps of `real_dt`, starting
    /// from `start_time`. Step 0 uses the two-point backward difference and
    /// every later step the three-point one. `after_iteration` runs after
    /// each pseudo iteration, before the residual is checked.
    pub fn solve_transient<H>(
        &self,
        mesh: &mut Mesh,
        integrator: &mut dyn TimeIntegrator,
        start_time: f64,
        real_dt: f64,
        num_steps: usize,
        mut after_iteration: H,
    ) -> Result<TransientReport>
    where
        H: FnMut(&mut Mesh),
    {
        integrator.set_courant_number(self.config.courant_number);
        integrator.set_time_discretization(Some(Box::new(TwoPointTimeDiscretization::new(
            mesh,
            self.eqn.as_ref(),
            real_dt,
        ))));
        info!(
            "{}: {} real time steps of {} on {} cells",
            self.eqn.description(),
            num_steps,
            real_dt,
            mesh.num_cells()
        );

        let dir = self.config.prepare_working_directory()?;
        let mut steps_wtr = match dir {
            Some(dir) => Some(Writer::from_path(dir.join("steps.csv"))?),
            None => None,
        };

        let pb = progress_bar(num_steps as u64, self.config.show_progress);
        let mut iterations = Vec::with_capacity(num_steps);
        let mut time = start_time;
        for step in 0..num_steps {
            let target = time + real_dt;
            let mut count = self.config.max_iterations;
            let mut converged = false;
            for iter in 0..self.config.max_iterations {
                integrator.update_cell_averages(mesh, target)?;
                after_iteration(mesh);
                let residual = total_residual(mesh, self.config.convergence_norm);
                debug!("step {} iteration {}: {:?}", step, iter + 1, residual);
                if self.convergence.has_converged(&residual)? {
                    count = iter + 1;
                    converged = true;
                    break;
                }
            }
            if !converged {
                warn!("real time step {} not converged in {} iterations", step, count);
            }
            info!("time {:.6}: {} iterations", target, count);
            iterations.push(count);

            let next = match integrator.time_discretization_mut() {
                Some(td) => {
                    td.shift_solution(mesh.fields.u_all());
                    if step == 0 {
                        td.next_order()
                    } else {
                        None
                    }
                }
                None => None,
            };
            if next.is_some() {
                integrator.set_time_discretization(next);
            }

            if let Some(wtr) = steps_wtr.as_mut() {
                wtr.serialize(StepRow {
                    step,
                    time: target,
                    iterations: count,
                    converged,
                })?;
            }
            time = target;
            pb.inc(1);
        }
        pb.finish_with_message("simulation complete");

        if let Some(mut wtr) = steps_wtr {
            wtr.flush()?;
        }
        if let Some(dir) = dir {
            write_solution(dir.join("solution.csv"), &self.eqn.var_names(), mesh)?;
        }

        Ok(TransientReport {
            iterations,
            final_time: time,
        })
    }
}
