// Example: lengths, prefix offsets and hit-testing with a position index.
use vlist::PositionIndex;

fn main() {
    // Unmeasured rows start at 0 and get their real height once laid out.
    let mut index: PositionIndex<String> = (0..10_000)
        .map(|i| (format!("row-{i}"), 0))
        .collect();
    for i in 0..40 {
        index.update_length(i, 20 + (i as u32 % 3) * 10);
    }
    println!("len={} total_length={}", index.len(), index.total_length());

    let hit = index.get_by_distance(415).expect("non-empty");
    println!(
        "distance 415 -> {} (index {}, starts at {}, {} px into it)",
        hit.item, hit.index, hit.outer_distance, hit.inner_distance
    );

    index.insert(0, "header".to_string(), 64);
    println!("row-10 now starts at {}", index.offset_of(11));

    let (removed, length) = index.delete(0).expect("in range");
    println!("removed {removed} ({length} px)");

    match index.try_get_by_index(20_000) {
        Ok(found) => println!("unexpected hit: {}", found.item),
        Err(err) => println!("strict lookup: {err}"),
    }
}
