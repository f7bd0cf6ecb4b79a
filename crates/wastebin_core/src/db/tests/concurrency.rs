use super::*;

const THREADS: usize = 8;
const PER_THREAD: usize = 10;

#[test]
fn concurrent_distinct_writers_all_land() {
    for (label, db, _temp) in each_backend() {
        let db = Arc::new(db);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let db = db.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..PER_THREAD {
                        let name = format!("w{}/p{}", t, i);
                        db.write(&name, &name).expect("write");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let names = db.list("").expect("list");
        assert_eq!(names.len(), THREADS * PER_THREAD, "{}", label);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted, "{}: list must be ascending", label);
        for name in &names {
            assert_eq!(&db.read(name).expect("read"), name, "{}", label);
        }
    }
}

#[test]
fn same_name_writers_leave_one_complete_value() {
    for (label, db, _temp) in each_backend() {
        let db = Arc::new(db);
        let barrier = Arc::new(Barrier::new(THREADS));
        let bodies: Vec<String> = (0..THREADS).map(|t| format!("{}", t).repeat(4096)).collect();

        let handles: Vec<_> = bodies
            .iter()
            .cloned()
            .map(|body| {
                let db = db.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    db.write("shared", &body).expect("write");
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread");
        }

        let stored = db.read("shared").expect("read");
        assert!(
            bodies.contains(&stored),
            "{}: stored content is not one of the written values",
            label
        );
        assert_eq!(db.list("").expect("list"), vec!["shared"], "{}", label);
    }
}

#[test]
fn readers_never_observe_partial_content() {
    for (label, db, _temp) in each_backend() {
        let db = Arc::new(db);
        let first = "a".repeat(64 * 1024);
        let second = "b".repeat(64 * 1024);
        db.write("hot", &first).expect("seed");

        let writer = {
            let db = db.clone();
            let (first, second) = (first.clone(), second.clone());
            thread::spawn(move || {
                for i in 0..50 {
                    let body = if i % 2 == 0 { &second } else { &first };
                    db.write("hot", body).expect("write");
                }
            })
        };
        for _ in 0..50 {
            let seen = db.read("hot").expect("read");
            assert!(seen == first || seen == second, "{}: torn read", label);
        }
        writer.join().expect("writer thread");
    }
}

#[test]
fn concurrent_deletes_report_exactly_one_success() {
    for (label, db, _temp) in each_backend() {
        db.write("victim", "x").expect("write");
        let db = Arc::new(db);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let db = db.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    db.delete("victim")
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("delete thread"))
            .collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let missing = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::NotFound)))
            .count();
        assert_eq!(ok, 1, "{}", label);
        assert_eq!(missing, THREADS - 1, "{}", label);
        assert!(db.list("").expect("list").is_empty(), "{}", label);
    }
}
