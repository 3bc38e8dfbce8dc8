use std::collections::HashMap;

pub const MAX_SEAT_PERMUTATIONS: usize = 24;

/// Deterministic assignments of the four configured agents to the seats
/// Bottom, Left, Top, Right. Ordered so that the first six cover every
/// partnership on both sides of the table before any lineup repeats.
pub struct SeatPermutations {
    permutations: Vec<[usize; 4]>,
}

impl SeatPermutations {
    pub fn new(count: usize) -> Self {
        let mut all = Vec::with_capacity(MAX_SEAT_PERMUTATIONS);
        let mut base = [0usize, 1, 2, 3];
        generate(&mut base, 0, &mut all);

        let mut seen: HashMap<[usize; 2], usize> = HashMap::new();
        let mut ranked: Vec<(usize, [usize; 4])> = all
            .into_iter()
            .map(|perm| {
                let repeats = seen.entry(team1_lineup(&perm)).or_insert(0);
                let rank = *repeats;
                *repeats += 1;
                (rank, perm)
            })
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);

        let permutations = ranked
            .into_iter()
            .take(count.min(MAX_SEAT_PERMUTATIONS))
            .map(|(_, perm)| perm)
            .collect();
        Self { permutations }
    }

    pub fn as_slice(&self) -> &[[usize; 4]] {
        &self.permutations
    }
}

/// Agents sitting Bottom and Top.
fn team1_lineup(perm: &[usize; 4]) -> [usize; 2] {
    let mut pair = [perm[0], perm[2]];
    pair.sort_unstable();
    pair
}

fn generate(data: &mut [usize; 4], start: usize, output: &mut Vec<[usize; 4]>) {
    if start == data.len() - 1 {
        output.push(*data);
        return;
    }

    for idx in start..data.len() {
        data.swap(start, idx);
        generate(data, start + 1, output);
        data.swap(start, idx);
    }
}
