use lineage::{check_chain, ArrayDataset, ChainTraversal};

fn main() {
    // 1. Assemble a three-level chain: storms own flashes, flashes own
    //    strokes. Ids are unsorted and non-contiguous on purpose.
    let dataset = ArrayDataset::builder()
        .dimension("nstorms", 3)
        .dimension("nflashes", 5)
        .dimension("nstrokes", 7)
        .ids("nstorms", "storm_id", vec![0, 1, 2])
        .ids("nflashes", "flash_id", vec![10, 11, 12, 13, 14])
        .ids("nflashes", "flash_parent_storm_id", vec![0, 0, 2, 2, 2])
        .ids("nstrokes", "stroke_id", vec![46, 23, 13, 9, 7, 6, 4])
        .ids(
            "nstrokes",
            "stroke_parent_flash_id",
            vec![10, 10, 11, 12, 12, 13, 14],
        )
        .values(
            "nstrokes",
            "stroke_peak_current_ka",
            vec![12.5, -8.0, 31.0, 5.5, -17.2, 9.9, 22.1],
        )
        .build()
        .unwrap();

    let traversal = ChainTraversal::new(
        &dataset,
        &["storm_id", "flash_id", "stroke_id"],
        &["flash_parent_storm_id", "stroke_parent_flash_id"],
    )
    .unwrap();

    // 2. Sanity-check the chain before doing anything with it.
    let health = check_chain(&dataset, traversal.chain());
    println!("{health}");

    // 3. Children per storm, then strokes per storm across two hops.
    let counts = traversal.count_children(&["storm_id"]).unwrap();
    println!("flashes per storm:  {:?}", counts[0]);
    let strokes_per_storm = traversal.count_descendants("storm_id", "stroke_id").unwrap();
    println!("strokes per storm:  {strokes_per_storm:?}");

    // 4. Which storm produced each stroke?
    let storm_of_stroke = traversal
        .replicate_parent_ids_strict("storm_id", "stroke_parent_flash_id")
        .unwrap();
    println!("storm per stroke:   {storm_of_stroke:?}");

    // 5. Keep only two strokes; the rest of the hierarchy follows.
    let reduced = traversal
        .reduce_to_entities("stroke_id", &[23, 9])
        .unwrap();
    println!("reduced storms:     {:?}", reduced.ids("storm_id").unwrap());
    println!("reduced flashes:    {:?}", reduced.ids("flash_id").unwrap());
    println!("reduced strokes:    {:?}", reduced.ids("stroke_id").unwrap());
    println!(
        "reduced currents:   {:?}",
        reduced.values("stroke_peak_current_ka").unwrap()
    );
}
