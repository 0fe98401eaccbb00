//! Basic usage examples for lazyweld
//!
//! Run with: cargo run --example basic

use lazyweld::prelude::*;

/// Example 1: Transform and filter a finite stream
async fn transform_filter_example() {
    println!("=== Transform and Filter ===");

    let squares = from_iter(1..21)
        .filter(|x, _, _| x % 3 == 0)
        .map(|x, _, _| x * x)
        .list()
        .await;

    println!("Squares of multiples of three: {:?}", squares);
    println!();
}

/// Example 2: Bounding infinite sources
async fn infinite_example() {
    println!("=== Infinite Sources ===");

    let every_third = count(0).slice((3, 20, 3)).list().await;
    println!("count(0)[3:20:3] = {:?}", every_third);

    let below_ten = count(1).take_while(|x, _, _| *x < 10).list().await;
    println!("take_while(< 10) = {:?}", below_ten);

    let cycled = stream!["red", "green", "blue"].cycle().slice((0, 7)).list().await;
    println!("cycle = {:?}", cycled);
    println!();
}

/// Example 3: Combining several streams
async fn combinator_example() {
    println!("=== Combinators ===");

    let rows = zip_longest([stream![1, 2, 3], stream![10, 20]]).list().await;
    println!("zip_longest = {:?}", rows);

    let sums = multi_map([count(0), count(100), repeat(1000, Some(3))], |row| {
        row.into_iter().sum::<i64>()
    })
    .list()
    .await;
    println!("multi_map sum = {:?}", sums);

    let chained = stream![1, 2].chain(stream![3, 4]).list().await;
    println!("chain = {:?}", chained);
    println!();
}

/// Example 4: Fan-out with tee
async fn tee_example() -> Result<()> {
    println!("=== Tee ===");

    let (left, right) = from_iter(1..=10).tee2();
    let total = tokio::spawn(left.reduce(|acc, x| acc + x, 0));
    let has_seven = right.some(|x, _, _| *x == 7);

    println!("sum = {}", total.await?);
    println!("contains 7 = {}", has_seven.await?);
    println!();
    Ok(())
}

/// Example 5: Dynamically typed rows
async fn value_example() -> Result<()> {
    println!("=== Values ===");

    let rows = values([
        Value::from(vec![Value::from("apples"), Value::from(3i64)]),
        Value::from(vec![Value::from("pears"), Value::from(5i64)]),
    ]);

    let mut labels = rows.starmap(|args| match args.as_slice() {
        [name, qty] => format!("{} x{}", name, qty),
        _ => String::from("?"),
    });

    while let Some(label) = labels.next().await {
        println!("{}", label);
    }

    let checked = Value::from("three").as_int();
    println!("as_int on a string: {:?}", checked);
    println!();
    Ok(())
}

/// Example 6: Cancelling a family of streams
async fn scope_example() {
    println!("=== Scopes ===");

    let scope = Scope::new();
    let mut ticks = scope.count(0).map(|x, _, _| x * 10);

    for _ in 0..3 {
        if let Some(tick) = ticks.next().await {
            println!("tick {}", tick);
        }
    }

    scope.cancel();
    let mut leftover = 0;
    while ticks.next().await.is_some() {
        leftover += 1;
    }
    println!("stopped after {} buffered elements", leftover);
}

#[tokio::main]
async fn main() -> Result<()> {
    transform_filter_example().await;
    infinite_example().await;
    combinator_example().await;
    tee_example().await?;
    value_example().await?;
    scope_example().await;
    Ok(())
}
