use std::collections::HashMap;

use sweeper_core::{Mark, MineField, Point, Rect, UncoverOutcome, ViewCell, FLOOD_FILL_RADIUS};

const ZERO_SEED: [u8; 16] = [0; 16];

fn zero_field() -> MineField {
    MineField::new(ZERO_SEED, 5)
}

fn mine_field() -> MineField {
    // with this seed the origin is a mine
    let mut seed = [0; 16];
    seed[0] = 1;
    MineField::new(seed, 5)
}

/// Checks every field-state invariant that must hold after any sequence of
/// operations: pairwise disjoint key sets, stored counts matching the oracle,
/// and triggered cells actually being mines.
fn audit(field: &MineField) {
    for p in field.uncovered().keys() {
        assert!(!field.triggered().contains(p), "{p} uncovered and triggered");
        assert!(!field.marks().contains_key(p), "{p} uncovered and marked");
        assert!(!field.is_mine(*p), "{p} uncovered but is a mine");
    }
    for p in field.triggered() {
        assert!(!field.marks().contains_key(p), "{p} triggered and marked");
        assert!(field.is_mine(*p), "{p} triggered but is not a mine");
    }
    for (p, &count) in field.uncovered() {
        assert_eq!(count, field.neighboring_mines(*p), "stale count at {p}");
    }
}

#[test]
fn uncover_reveals_a_numbered_cell() {
    let mut field = zero_field();
    // (0, 0) is not a mine and borders (-1, 0) and (1, 1)
    let (outcome, count) = field.uncover(Point::new(0, 0));
    assert_eq!(outcome, UncoverOutcome::Miss);
    assert_eq!(count, 1);
    assert_eq!(field.uncovered().get(&Point::new(0, 0)), Some(&2));
    audit(&field);
}

#[test]
fn uncover_is_idempotent() {
    let mut field = zero_field();
    let (_, first) = field.uncover(Point::new(0, 0));
    assert_eq!(first, 1);
    let (outcome, second) = field.uncover(Point::new(0, 0));
    assert_eq!(outcome, UncoverOutcome::Miss);
    assert_eq!(second, 0);
    audit(&field);
}

#[test]
fn uncover_on_a_mine_goes_boom() {
    let mut field = mine_field();
    let (outcome, count) = field.uncover(Point::new(0, 0));
    assert_eq!(outcome, UncoverOutcome::Boom);
    assert_eq!(count, 1);
    assert!(field.triggered().contains(&Point::new(0, 0)));
    assert!(field.uncovered().is_empty());

    // a triggered mine stays triggered
    let (outcome, count) = field.uncover(Point::new(0, 0));
    assert_eq!(outcome, UncoverOutcome::Miss);
    assert_eq!(count, 0);
    audit(&field);
}

#[test]
fn flood_fill_matches_the_pinned_region() {
    // (-3, -12) has zero neighboring mines under the zero seed; the flood
    // stops at the surrounding numbered border
    let expected: HashMap<Point, u8> = [
        ((-4, -15), 1),
        ((-4, -14), 1),
        ((-4, -13), 1),
        ((-4, -12), 1),
        ((-4, -11), 1),
        ((-3, -15), 1),
        ((-3, -14), 0),
        ((-3, -13), 0),
        ((-3, -12), 0),
        ((-3, -11), 1),
        ((-2, -15), 2),
        ((-2, -14), 2),
        ((-2, -13), 1),
        ((-2, -12), 1),
        ((-2, -11), 1),
    ]
    .into_iter()
    .map(|((x, y), n)| (Point::new(x, y), n))
    .collect();

    let mut field = zero_field();
    let (outcome, count) = field.uncover(Point::new(-3, -12));
    assert_eq!(outcome, UncoverOutcome::Miss);
    assert_eq!(count, expected.len() as u64);
    assert_eq!(field.uncovered(), &expected);
    audit(&field);
}

#[test]
fn flood_fill_stays_within_the_radius() {
    let mut field = zero_field();
    let seed = Point::new(-3, -12);
    let (outcome, count) = field.uncover(seed);
    assert_eq!(outcome, UncoverOutcome::Miss);
    assert!(count >= 1);
    for p in field.uncovered().keys() {
        assert!(seed.distance(*p) <= FLOOD_FILL_RADIUS, "{p} too far from {seed}");
    }
}

#[test]
fn flood_fill_skips_previously_uncovered_cells() {
    let mut field = zero_field();
    let (_, first) = field.uncover(Point::new(-2, -13));
    assert_eq!(first, 1);
    let (_, flooded) = field.uncover(Point::new(-3, -12));
    // the pinned region minus the cell revealed up front
    assert_eq!(flooded, 14);
    audit(&field);
}

#[test]
fn mark_cycles_back_to_unmarked() {
    let mut field = zero_field();
    let p = Point::new(5, 5);

    field.mark(p);
    assert_eq!(field.marks().get(&p), Some(&Mark::Flag));
    field.mark(p);
    assert_eq!(field.marks().get(&p), Some(&Mark::Question));
    field.mark(p);
    assert!(!field.marks().contains_key(&p));
    audit(&field);
}

#[test]
fn mark_is_refused_on_revealed_cells() {
    let mut field = zero_field();
    let p = Point::new(0, 0);
    field.uncover(p);
    field.mark(p);
    assert!(field.marks().is_empty());

    let mut field = mine_field();
    field.uncover(Point::new(0, 0));
    field.mark(Point::new(0, 0));
    assert!(field.marks().is_empty());
    audit(&field);
}

#[test]
fn uncover_clears_the_mark() {
    let mut field = zero_field();
    let p = Point::new(0, 0);
    field.mark(p);
    field.uncover(p);
    assert!(!field.marks().contains_key(&p));
    audit(&field);
}

#[test]
fn flood_fill_clears_marks_in_its_path() {
    let mut field = zero_field();
    let flagged = Point::new(-4, -14);
    field.mark(flagged);
    field.uncover(Point::new(-3, -12));
    assert!(!field.marks().contains_key(&flagged));
    assert!(field.uncovered().contains_key(&flagged));
    audit(&field);
}

#[test]
fn view_has_the_requested_shape() {
    let field = zero_field();
    let rect = Rect::new(-3, -3, 3, 3);
    let view = field.extract_view(rect);
    assert_eq!(view.position, rect);
    assert_eq!(view.data.len(), 6);
    for row in &view.data {
        assert_eq!(row.len(), 6);
    }
}

#[test]
fn covered_mines_are_not_leaked() {
    let field = zero_field();
    // the rectangle contains mines, but nothing has been uncovered
    let view = field.extract_view(Rect::new(-3, -3, 3, 3));
    for row in &view.data {
        for cell in row {
            assert_eq!(*cell, ViewCell::Blank);
        }
    }
}

#[test]
fn view_symbols_follow_cell_state() {
    let mut field = zero_field();
    field.uncover(Point::new(0, 0));
    field.mark(Point::new(1, 0));
    field.mark(Point::new(2, 0));
    field.mark(Point::new(2, 0));

    let view = field.extract_view(Rect::new(-3, -3, 3, 3));
    // world (x, y) lands at data[y - min.y][x - min.x]
    assert_eq!(view.data[3][3], ViewCell::Count(2));
    assert_eq!(view.data[3][4], ViewCell::Flag);
    assert_eq!(view.data[3][5], ViewCell::Question);
    assert_eq!(view.data[0][0], ViewCell::Blank);
}

#[test]
fn triggered_mines_show_as_mines() {
    let mut field = mine_field();
    field.uncover(Point::new(0, 0));
    let view = field.extract_view(Rect::new(-1, -1, 2, 2));
    assert_eq!(view.data[1][1], ViewCell::Mine);
}

#[test]
fn random_walk_preserves_invariants() {
    let mut field = zero_field();
    // a fixed pseudo-random batch of interleaved operations
    let mut state = 0x2545_f491_4f6c_dd1du64;
    for _ in 0..400 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let x = (state % 41) as i64 - 20;
        let y = ((state >> 8) % 41) as i64 - 20;
        let p = Point::new(x, y);
        if state % 3 == 0 {
            field.mark(p);
        } else {
            field.uncover(p);
        }
    }
    audit(&field);
}
