//! Derivative-free Nelder-Mead minimizer with an iteration budget and a wall-clock deadline.

use std::time::{Duration, Instant};

use thiserror::Error;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

const FTOL: f64 = 1e-10;
const FATOL: f64 = 1e-12;
const XTOL: f64 = 1e-8;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum OptimizeError {
    #[error("objective is not finite at the starting point")]
    NonFinite,
    #[error("did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },
    #[error("fit exceeded the {limit_ms} ms time limit")]
    Timeout { limit_ms: u128 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct NelderMead {
    max_iterations: usize,
    timeout: Duration,
}

impl NelderMead {
    pub fn new(max_iterations: usize, timeout: Duration) -> Self {
        Self { max_iterations, timeout }
    }

    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum, OptimizeError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let started = Instant::now();
        let evaluate = |point: &[f64]| {
            let value = objective(point);
            if value.is_finite() {
                value
            } else {
                f64::INFINITY
            }
        };

        let initial = evaluate(start);
        if !initial.is_finite() {
            return Err(OptimizeError::NonFinite);
        }
        if start.is_empty() {
            return Ok(Minimum { point: Vec::new(), value: initial, iterations: 0 });
        }

        let mut simplex = initial_simplex(start);
        let mut values: Vec<f64> = simplex.iter().map(|vertex| evaluate(vertex)).collect();

        for iteration in 0..self.max_iterations {
            sort_simplex(&mut simplex, &mut values);

            if converged(&simplex, &values) {
                return Ok(Minimum {
                    point: simplex[0].clone(),
                    value: values[0],
                    iterations: iteration,
                });
            }
            if started.elapsed() > self.timeout {
                return Err(OptimizeError::Timeout { limit_ms: self.timeout.as_millis() });
            }

            let worst = simplex.len() - 1;
            let centroid = centroid(&simplex[..worst]);

            let reflected = along(&centroid, &simplex[worst], -REFLECTION);
            let reflected_value = evaluate(&reflected);

            if reflected_value < values[0] {
                let expanded = along(&centroid, &simplex[worst], -EXPANSION);
                let expanded_value = evaluate(&expanded);
                if expanded_value < reflected_value {
                    simplex[worst] = expanded;
                    values[worst] = expanded_value;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = reflected_value;
                }
                continue;
            }

            if reflected_value < values[worst - 1] {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
                continue;
            }

            let (contracted, contracted_value) = if reflected_value < values[worst] {
                let outside = along(&centroid, &simplex[worst], -CONTRACTION);
                let value = evaluate(&outside);
                (outside, value)
            } else {
                let inside = along(&centroid, &simplex[worst], CONTRACTION);
                let value = evaluate(&inside);
                (inside, value)
            };

            if contracted_value < values[worst].min(reflected_value) {
                simplex[worst] = contracted;
                values[worst] = contracted_value;
                continue;
            }

            let best = simplex[0].clone();
            for (vertex, value) in simplex.iter_mut().zip(values.iter_mut()).skip(1) {
                *vertex = along(&best, vertex, SHRINK);
                *value = evaluate(vertex);
            }
        }

        sort_simplex(&mut simplex, &mut values);
        if converged(&simplex, &values) {
            return Ok(Minimum {
                point: simplex[0].clone(),
                value: values[0],
                iterations: self.max_iterations,
            });
        }
        Err(OptimizeError::NonConvergence { iterations: self.max_iterations })
    }
}

fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.to_vec());
    for axis in 0..start.len() {
        let mut vertex = start.to_vec();
        vertex[axis] += if start[axis] != 0.0 { 0.05 * start[axis] } else { 0.1 };
        simplex.push(vertex);
    }
    simplex
}

fn sort_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut order: Vec<usize> = (0..simplex.len()).collect();
    order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));
    *simplex = order.iter().map(|index| simplex[*index].clone()).collect();
    *values = order.iter().map(|index| values[*index]).collect();
}

fn converged(simplex: &[Vec<f64>], values: &[f64]) -> bool {
    let best = values[0];
    let spread = values.iter().map(|value| (value - best).abs()).fold(0.0, f64::max);
    if spread <= FTOL * best.abs() + FATOL {
        return true;
    }

    let anchor = &simplex[0];
    let scale = anchor.iter().map(|x| x.abs()).fold(1.0, f64::max);
    let diameter = simplex
        .iter()
        .skip(1)
        .flat_map(|vertex| vertex.iter().zip(anchor).map(|(x, a)| (x - a).abs()))
        .fold(0.0, f64::max);
    diameter <= XTOL * scale
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let dims = vertices[0].len();
    let count = vertices.len() as f64;
    (0..dims).map(|axis| vertices.iter().map(|vertex| vertex[axis]).sum::<f64>() / count).collect()
}

/// `origin + coefficient * (target - origin)`.
fn along(origin: &[f64], target: &[f64], coefficient: f64) -> Vec<f64> {
    origin.iter().zip(target).map(|(o, t)| o + coefficient * (t - o)).collect()
}
