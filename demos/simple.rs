use std::{sync::Arc, thread};

use atbuiltin_rwlock::{Policy, RwLock, RwLockAttr};

fn main() {
    let mut attr = RwLockAttr::new();
    attr.set_policy(Policy::WritePriority);

    let counter = Arc::new(RwLock::with_attr(0, attr));

    let writer = thread::spawn({
        let counter = counter.clone();
        move || {
            for _ in 0..1000 {
                *counter.write() += 1;
            }
        }
    });

    for _ in 0..1000 {
        println!("read {}", *counter.read());
    }

    writer.join().unwrap();

    assert_eq!(*counter.read(), 1000);
}
