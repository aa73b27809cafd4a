mod viewer;

use viewer::app_setup::create_app;

fn main() {
    create_app().run();
}
