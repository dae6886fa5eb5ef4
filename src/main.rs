mod ui;

fn main() {
    ui::run_app();
}
