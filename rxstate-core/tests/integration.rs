//! Integration Tests for Selectors and Stores
//!
//! These tests verify that memoized functions, composed selectors and stores
//! work together correctly.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use rxstate_core::selectors::{
    create_selector, create_selector_creator, create_selector_with, input, memoize_variadic,
    memoize_with, ptr_equality, strict_equality, DefaultMemoizer, MemoizeConfig, MemoizeOptions,
    SelectorOptions,
};
use rxstate_core::store::{Action, DevContext, ReducerMap, Store, RESET_STATE};
use rxstate_core::ConfigError;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Shop {
    tax_percent: f64,
    items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Item {
    name: String,
    value: f64,
}

fn shop() -> Shop {
    Shop {
        tax_percent: 8.0,
        items: vec![
            Item {
                name: "apple".to_string(),
                value: 1.20,
            },
            Item {
                name: "orange".to_string(),
                value: 0.95,
            },
        ],
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[derive(Debug, Clone, PartialEq)]
struct Total {
    total: f64,
}

/// Test the classic subtotal / tax / total selector chain.
#[test]
fn shop_selectors_compose() {
    let reduce_calls = Arc::new(AtomicI32::new(0));
    let reduce_calls_clone = reduce_calls.clone();

    let select_shop_items = input(|shop: &Shop| shop.items.clone());
    let select_tax_percent = input(|shop: &Shop| shop.tax_percent);

    let select_subtotal = create_selector(vec![select_shop_items], move |items: &[Vec<Item>]| {
        reduce_calls_clone.fetch_add(1, Ordering::SeqCst);
        items[0].iter().fold(0.0, |acc, item| acc + item.value)
    });
    let select_tax = create_selector(
        vec![select_subtotal.as_input(), select_tax_percent],
        |values: &[f64]| values[0] * (values[1] / 100.0),
    );
    let select_total = create_selector(
        vec![select_subtotal.as_input(), select_tax.as_input()],
        |values: &[f64]| Total {
            total: values[0] + values[1],
        },
    );

    let state = shop();
    assert!(close(select_subtotal.select(&state), 2.15));
    assert!(close(select_tax.select(&state), 0.172));
    assert!(close(select_total.select(&state).total, 2.322));

    // The same state again runs nothing.
    let again = select_total.select(&state);
    assert!(close(again.total, 2.322));
    assert_eq!(reduce_calls.load(Ordering::SeqCst), 1);
    assert_eq!(select_subtotal.recomputations(), 1);
    assert_eq!(select_tax.recomputations(), 1);
    assert_eq!(select_total.recomputations(), 1);
}

/// Test that a state change unrelated to the inputs skips the combiner.
#[test]
fn unrelated_change_skips_combiner() {
    let combiner_calls = Arc::new(AtomicI32::new(0));
    let combiner_calls_clone = combiner_calls.clone();

    let select_names = create_selector(
        vec![input(|shop: &Shop| {
            shop.items
                .iter()
                .map(|item| item.name.clone())
                .collect::<Vec<_>>()
        })],
        move |names: &[Vec<String>]| {
            combiner_calls_clone.fetch_add(1, Ordering::SeqCst);
            names[0].join(", ")
        },
    );

    let mut state = shop();
    assert_eq!(select_names.select(&state), "apple, orange");

    state.tax_percent = 20.0;
    assert_eq!(select_names.select(&state), "apple, orange");
    assert_eq!(combiner_calls.load(Ordering::SeqCst), 1);
}

/// Test identity comparison of shared state.
#[test]
fn identity_equality_for_shared_state() {
    let input_calls = Rc::new(Cell::new(0));
    let input_calls_clone = Rc::clone(&input_calls);

    let select_len = create_selector_with(
        vec![input(move |state: &Rc<Vec<i32>>| {
            input_calls_clone.set(input_calls_clone.get() + 1);
            state.len()
        })],
        |lens: &[usize]| lens[0],
        SelectorOptions::new(
            MemoizeOptions::equality(ptr_equality::<Vec<i32>>),
            MemoizeOptions::equality(strict_equality::<usize>),
        ),
    );

    let state = Rc::new(vec![1, 2, 3]);
    select_len.select(&state);
    select_len.select(&Rc::clone(&state));
    assert_eq!(input_calls.get(), 1);

    // Equal contents in a new allocation are a different state.
    select_len.select(&Rc::new(vec![1, 2, 3]));
    assert_eq!(input_calls.get(), 2);
    assert_eq!(select_len.recomputations(), 1);
}

/// Test the hash strategy across many distinct argument tuples.
#[test]
fn hash_memoizer_caches_every_tuple() {
    let calls = Rc::new(Cell::new(0));
    let calls_clone = Rc::clone(&calls);

    let concat = memoize_variadic(move |parts: &[String]| {
        calls_clone.set(calls_clone.get() + 1);
        parts.concat()
    });

    for _ in 0..3 {
        for i in 0..10 {
            let args = [format!("k{i}"), "-".to_string(), format!("v{i}")];
            assert_eq!(concat.call_variadic(&args), format!("k{i}-v{i}"));
        }
    }
    assert_eq!(calls.get(), 10);
    assert_eq!(concat.stats().hits, 20);
}

/// Test an LRU memoizer built from JSON configuration.
#[test]
fn configured_lru_memoizer() {
    let config = MemoizeConfig::from_json(r#"{"equality": {"size": 2}}"#).unwrap();
    let options: MemoizeOptions<u32, u32> = config.into_options().unwrap();

    let calls = Rc::new(Cell::new(0));
    let calls_clone = Rc::clone(&calls);
    let square = memoize_with(
        move |x: &u32| {
            calls_clone.set(calls_clone.get() + 1);
            x * x
        },
        options,
    );

    square.call(&1);
    square.call(&2);
    square.call(&1);
    square.call(&3);
    square.call(&2);
    assert_eq!(calls.get(), 4);
}

/// Test that conflicting strategies are reported.
#[test]
fn conflicting_configuration_fails() {
    let err = MemoizeConfig::from_json(r#"{"equality": {"size": 2}, "hash": true}"#).unwrap_err();
    assert!(matches!(err, ConfigError::ConflictingCacheOptions { .. }));
    assert!(err.to_string().contains("can't be combined"));
}

/// Test a custom selector creator with LRU defaults.
#[test]
fn creator_defaults_apply_to_every_selector() {
    let creator = create_selector_creator(
        DefaultMemoizer,
        SelectorOptions::<u32, u32, u32>::lru(3),
    );
    let select_mod = creator
        .builder()
        .input(|x: &u32| x % 10)
        .build(|values: &[u32]| values[0]);

    for x in [1, 2, 3, 1, 2, 3] {
        select_mod.select(&x);
    }
    assert_eq!(select_mod.recomputations(), 3);
}

/// Test selectors reading from a store.
#[test]
fn store_feeds_selectors() {
    let reducer = ReducerMap::new()
        .on("[ADD_ITEM]", |state: &Shop, action: &Action<Item>| {
            let mut next = state.clone();
            if let Some(item) = action.payload() {
                next.items.push(item.clone());
            }
            next
        })
        .on(RESET_STATE, |_: &Shop, _: &Action<Item>| shop());
    let store = Store::new(reducer, shop());

    let select_count = create_selector_with(
        vec![input(|shop: &Shop| shop.items.len())],
        |counts: &[usize]| counts[0],
        SelectorOptions::hash(),
    );

    assert_eq!(store.select_with(&select_count), 2);
    store.dispatch(Action::with_payload(
        "[ADD_ITEM]",
        Item {
            name: "pear".to_string(),
            value: 2.0,
        },
    ));
    assert_eq!(store.select_with(&select_count), 3);

    store.dispatch(Action::reset_state());
    assert_eq!(store.select_with(&select_count), 2);
    // The hash cache remembers the first state.
    assert_eq!(select_count.recomputations(), 2);
}

/// Test the development registry across several stores.
#[test]
fn dev_context_tracks_named_stores() {
    let dev = DevContext::new();
    dev.init();

    let counter = Store::named(
        |state: &i32, action: &&str| if *action == "[INCREMENT]" { state + 1 } else { *state },
        0,
        "counter",
        &dev,
    );
    let label = Store::named(
        |state: &String, action: &Action<String>| {
            action.payload().cloned().unwrap_or_else(|| state.clone())
        },
        String::new(),
        "label",
        &dev,
    );

    counter.dispatch("[INCREMENT]");
    label.dispatch(Action::with_payload("[SET]", "hello".to_string()));

    assert_eq!(dev.store_names(), vec!["counter", "label"]);
    let changes = dev.changes();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].store, "label");
    assert_eq!(changes[1].next, json!("hello"));

    dev.destroy_all();
    counter.dispatch("[INCREMENT]");
    assert_eq!(counter.state(), 1);
    assert!(label.is_destroyed());
}
