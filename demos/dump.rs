use nusb::MaybeFuture;
use padscope::{descriptors::StringRole, platform::NusbTransport};

const MICROSOFT_VID: u16 = 0x045E;

fn main() {
    env_logger::init();

    let Some(info) = nusb::list_devices()
        .wait()
        .unwrap()
        .find(|d| d.vendor_id() == MICROSOFT_VID)
    else {
        eprintln!("No Microsoft controller found");
        std::process::exit(1);
    };
    println!(
        "Found controller: {:04x}:{:04x}",
        info.vendor_id(),
        info.product_id()
    );

    let device = info.open().wait().unwrap();
    let mut transport = NusbTransport::new(device);
    let model = padscope::get_device_info(&mut transport).unwrap();

    println!("Family: {:?}", model.family());
    if let Some(product) = model.string(StringRole::Product) {
        println!("Product: {}", product.text());
    }

    for descriptor in model.descriptors() {
        println!("{descriptor:#?}");
    }
    for report in model.reports() {
        println!("{report:#?}");
    }
}
