//! Static locale definitions.
//!
//! Command phrases are stored lower-case; the resolver folds the transcript
//! before matching.

use super::{CommandVocabulary, ErrorText, Locale, StatusText};

pub static LOCALES: &[Locale] = &[EN_US, ES_ES, TH_TH];

// ---------------------------------------------------------------------------
// English (United States), the default locale
// ---------------------------------------------------------------------------

const EN_US: Locale = Locale {
    code: "en-US",
    display_name: "English",
    model_language: "English",
    task_labels: ["Find bus", "Cross road", "Explore", "Find shop"],
    mock_responses: [
        "I see bus number 123 arriving at the stop, about 20 meters ahead on your left.",
        "The pedestrian light is green and no cars are approaching. The crosswalk is straight ahead.",
        "You are on a wide sidewalk. There is a bench two meters ahead and a cafe entrance on your right.",
        "The shop you asked for is about 15 meters ahead on your right, next to a pharmacy.",
    ],
    commands: CommandVocabulary {
        find_bus: &["bus"],
        cross_road: &["cross", "road"],
        explore: &["explore", "around"],
        find_shop: &["shop", "store"],
    },
    status: StatusText {
        initializing: "Starting up…",
        ready: "Ready. Choose a task or tap the microphone.",
        processing: "Looking…",
        listening: "Listening…",
        acquiring_location: "Finding your location…",
        unrecognized_command: "Sorry, I did not understand that command.",
        shop_prompt: "Which shop are you looking for?",
        welcome: "Welcome. Say find bus, cross road, explore, or find shop.",
    },
    errors: ErrorText {
        camera_unavailable: "The camera is not available. Check camera access.",
        camera_not_ready: "The camera is not ready yet. Please try again.",
        invalid_credential: "The AI service key is invalid or lacks permission.",
        not_authorized: "This app is not authorized to use the AI service.",
        service_unavailable: "The AI service is unavailable right now. Please try again later.",
        connection_failed: "Connection failed. Check your internet connection.",
        timed_out: "The AI service took too long to answer.",
        empty_result: "I could not get a description of the scene.",
        analysis_failed: "Something went wrong while analysing the image.",
        speech_failed: "Speech output failed.",
        microphone_denied: "Microphone access was denied.",
        no_speech: "I did not hear anything.",
        listening_failed: "Voice recognition failed.",
        location_denied: "Location access was denied.",
        location_unavailable: "Your location is unavailable.",
        location_timeout: "Finding your location took too long.",
        location_unsupported: "Location is not supported on this device.",
    },
};

// ---------------------------------------------------------------------------
// Spanish (Spain)
// ---------------------------------------------------------------------------

const ES_ES: Locale = Locale {
    code: "es-ES",
    display_name: "Español",
    model_language: "Spanish",
    task_labels: ["Buscar autobús", "Cruzar calle", "Explorar", "Buscar tienda"],
    mock_responses: [
        "Veo el autobús número 123 llegando a la parada, a unos 20 metros a tu izquierda.",
        "El semáforo peatonal está en verde y no se acercan coches. El paso de peatones está justo delante.",
        "Estás en una acera ancha. Hay un banco a dos metros y la entrada de una cafetería a tu derecha.",
        "La tienda que buscas está a unos 15 metros a tu derecha, junto a una farmacia.",
    ],
    commands: CommandVocabulary {
        find_bus: &["autobús", "autobus", "bus"],
        cross_road: &["cruzar", "calle"],
        explore: &["explorar", "alrededor"],
        find_shop: &["tienda", "comercio"],
    },
    status: StatusText {
        initializing: "Iniciando…",
        ready: "Listo. Elige una tarea o toca el micrófono.",
        processing: "Mirando…",
        listening: "Escuchando…",
        acquiring_location: "Buscando tu ubicación…",
        unrecognized_command: "Lo siento, no entendí esa orden.",
        shop_prompt: "¿Qué tienda estás buscando?",
        welcome: "Bienvenido. Di buscar autobús, cruzar calle, explorar o buscar tienda.",
    },
    errors: ErrorText {
        camera_unavailable: "La cámara no está disponible. Revisa el acceso a la cámara.",
        camera_not_ready: "La cámara aún no está lista. Inténtalo de nuevo.",
        invalid_credential: "La clave del servicio de IA no es válida o no tiene permisos.",
        not_authorized: "Esta aplicación no está autorizada para usar el servicio de IA.",
        service_unavailable: "El servicio de IA no está disponible. Inténtalo más tarde.",
        connection_failed: "Falló la conexión. Revisa tu conexión a internet.",
        timed_out: "El servicio de IA tardó demasiado en responder.",
        empty_result: "No pude obtener una descripción de la escena.",
        analysis_failed: "Algo salió mal al analizar la imagen.",
        speech_failed: "Falló la salida de voz.",
        microphone_denied: "Se denegó el acceso al micrófono.",
        no_speech: "No escuché nada.",
        listening_failed: "Falló el reconocimiento de voz.",
        location_denied: "Se denegó el acceso a la ubicación.",
        location_unavailable: "Tu ubicación no está disponible.",
        location_timeout: "Buscar tu ubicación tardó demasiado.",
        location_unsupported: "La ubicación no es compatible con este dispositivo.",
    },
};

// ---------------------------------------------------------------------------
// Thai
// ---------------------------------------------------------------------------

const TH_TH: Locale = Locale {
    code: "th-TH",
    display_name: "ไทย",
    model_language: "Thai",
    task_labels: ["หารถเมล์", "ข้ามถนน", "สำรวจรอบตัว", "หาร้านค้า"],
    mock_responses: [
        "เห็นรถเมล์สาย 123 กำลังเข้าป้าย อยู่ห่างไปประมาณ 20 เมตรทางซ้าย",
        "สัญญาณไฟคนข้ามเป็นสีเขียว และไม่มีรถวิ่งเข้ามา ทางม้าลายอยู่ตรงหน้า",
        "คุณอยู่บนทางเท้ากว้าง มีม้านั่งอยู่ข้างหน้าสองเมตร และมีทางเข้าร้านกาแฟทางขวา",
        "ร้านที่คุณหาอยู่ห่างไปประมาณ 15 เมตรทางขวา ติดกับร้านขายยา",
    ],
    commands: CommandVocabulary {
        find_bus: &["รถเมล์", "รถบัส", "bus"],
        cross_road: &["ข้าม", "ถนน"],
        explore: &["สำรวจ", "รอบ"],
        find_shop: &["ร้าน"],
    },
    status: StatusText {
        initializing: "กำลังเริ่มต้น…",
        ready: "พร้อมแล้ว เลือกงานหรือแตะไมโครโฟน",
        processing: "กำลังดู…",
        listening: "กำลังฟัง…",
        acquiring_location: "กำลังหาตำแหน่งของคุณ…",
        unrecognized_command: "ขออภัย ไม่เข้าใจคำสั่งนั้น",
        shop_prompt: "คุณกำลังหาร้านอะไร",
        welcome: "ยินดีต้อนรับ พูดว่า หารถเมล์ ข้ามถนน สำรวจ หรือ หาร้าน",
    },
    errors: ErrorText {
        camera_unavailable: "ไม่สามารถใช้กล้องได้ กรุณาตรวจสอบสิทธิ์กล้อง",
        camera_not_ready: "กล้องยังไม่พร้อม กรุณาลองอีกครั้ง",
        invalid_credential: "คีย์บริการ AI ไม่ถูกต้องหรือไม่มีสิทธิ์",
        not_authorized: "แอปนี้ไม่ได้รับอนุญาตให้ใช้บริการ AI",
        service_unavailable: "บริการ AI ไม่พร้อมใช้งานในขณะนี้ กรุณาลองใหม่ภายหลัง",
        connection_failed: "การเชื่อมต่อล้มเหลว กรุณาตรวจสอบอินเทอร์เน็ต",
        timed_out: "บริการ AI ใช้เวลาตอบนานเกินไป",
        empty_result: "ไม่สามารถอธิบายภาพได้",
        analysis_failed: "เกิดข้อผิดพลาดระหว่างวิเคราะห์ภาพ",
        speech_failed: "การอ่านออกเสียงล้มเหลว",
        microphone_denied: "ไม่ได้รับอนุญาตให้ใช้ไมโครโฟน",
        no_speech: "ไม่ได้ยินเสียงพูด",
        listening_failed: "การรู้จำเสียงล้มเหลว",
        location_denied: "ไม่ได้รับอนุญาตให้เข้าถึงตำแหน่ง",
        location_unavailable: "ไม่สามารถระบุตำแหน่งได้",
        location_timeout: "การหาตำแหน่งใช้เวลานานเกินไป",
        location_unsupported: "อุปกรณ์นี้ไม่รองรับการระบุตำแหน่ง",
    },
};
