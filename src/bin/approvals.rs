// Snapshot maintenance tool.
// Usage: approvals pending [dir] | approvals approve [dir] | approvals diff <approved> <received> [-w]

fn main() {
    explicit_approvals::cli::run();
}
