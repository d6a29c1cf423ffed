use std::cmp::Ordering;

use crate::error::{AppError, AppResult};

use super::vectorizer::VectorModel;

/// Mean of the given rows as a dense query vector
pub fn mean_of_rows(model: &VectorModel, indices: &[usize]) -> Vec<f32> {
    let mut query = weighted_sum(model, &[(indices, 1.0)]);
    if !indices.is_empty() {
        let k = indices.len() as f32;
        for x in query.iter_mut() {
            *x /= k;
        }
    }
    query
}

/// `Σ weight × Σ rows` over each `(rows, weight)` group
pub fn weighted_sum(model: &VectorModel, groups: &[(&[usize], f32)]) -> Vec<f32> {
    let mut query = vec![0.0f32; model.dimensions()];
    for &(indices, weight) in groups {
        for row in indices.iter().filter_map(|&i| model.row(i)) {
            row.add_scaled_to(&mut query, weight);
        }
    }
    query
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Ranks every catalog row by cosine similarity to `query`
///
/// The query is L2-normalized first, so returned scores are true cosine
/// similarities even for summed or weighted aggregates. The result holds
/// exactly one `(row index, score)` pair per row, by descending score with
/// ties in ascending row order.
pub fn rank(query: &[f32], model: &VectorModel) -> AppResult<Vec<(usize, f32)>> {
    if model.is_empty() {
        return Err(AppError::InvalidInput(
            "Cannot rank against an empty catalog".to_string(),
        ));
    }
    if query.len() != model.dimensions() {
        return Err(AppError::InvalidInput(format!(
            "Query has {} dimensions, model has {}",
            query.len(),
            model.dimensions()
        )));
    }

    let mut query = query.to_vec();
    normalize(&mut query);

    let mut ranked: Vec<(usize, f32)> = model
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| (index, row.dot(&query)))
        .collect();

    ranked.sort_by(|a, b| by_score_then_index(a.1, a.0, b.1, b.0));
    Ok(ranked)
}

/// Descending score, ascending index on ties
pub(crate) fn by_score_then_index(
    a_score: f32,
    a_index: usize,
    b_score: f32,
    b_index: usize,
) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_index.cmp(&b_index))
}
